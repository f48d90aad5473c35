//! Core traits and types for APDU (Application Protocol Data Unit) operations
//!
//! This crate provides the foundational types for exchanging APDU commands
//! and responses with a smart card according to ISO/IEC 7816-4.
//!
//! ## Overview
//!
//! - [`Command`] and [`Response`] model short APDUs and their status words
//! - [`CardTransport`] is the contract a device driver implements: connect,
//!   disconnect, open and close a logical channel, and move raw bytes
//! - [`LogicalChannel`] owns one channel on the card and turns "send this
//!   command, get the full response" into STORE DATA segments and GET
//!   RESPONSE chains, serialized by a lock owned by the session
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

// Main modules
pub mod channel;
pub mod command;
pub mod constants;
pub mod response;
pub mod transport;

// Core error types
mod error;
pub use error::{Error, Result, ResultExt};

// Re-exports for common types
pub use channel::LogicalChannel;
pub use command::Command;
pub use response::Response;
pub use response::status::StatusWord;
pub use transport::{CardTransport, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, CardTransport, Command, Error, LogicalChannel, Response, Result,
        ResultExt, StatusWord, TransportError,
    };
}
