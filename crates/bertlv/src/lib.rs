//! BER-TLV codec for eUICC provisioning
//!
//! This crate reads and writes Basic Encoding Rules tag-length-value trees, the
//! format every SGP.22 card command and response is expressed in.
//!
//! ## Overview
//!
//! - [`Tag`] encodes class, form and tag number, including multi-byte tags
//! - [`length`] handles definite short and long form lengths up to `0xFFFFFF`
//! - [`Tlv`] is the recursive tree, with an ordered [`Builder`] for requests
//!   and depth-first lookup helpers for responses
//! - [`primitive`] converts integers, booleans and bit strings to and from
//!   value bytes
//!
//! Trees serialize to raw bytes for the card and to standard base64 when they
//! are embedded in JSON.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod length;
pub mod primitive;
pub mod tag;
pub mod tlv;

pub use error::{Error, Result};
pub use primitive::{BitFlag, BitString, DecodeValue, EncodeValue};
pub use tag::{Class, Form, Tag};
pub use tlv::{Builder, Tlv};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        BitFlag, BitString, Builder, Class, DecodeValue, EncodeValue, Error, Form, Result, Tag,
        Tlv,
    };
}
