//! SGP.22 eUICC remote provisioning
//!
//! This crate implements the Local Profile Assistant side of consumer eSIM
//! provisioning: the ES10b and ES10c functions sent to the card's ISD-R, the
//! ES9+ exchanges with an SM-DP+, and the profile download that ties them
//! together.
//!
//! ## Overview
//!
//! - [`Client`] holds the card session and the HTTP collaborator and exposes
//!   every card function, notification handling and
//!   [`Client::download_profile`]
//! - [`es10a`], [`es10b`] and [`es10c`] define each card function as a
//!   [`CardRequest`]
//! - [`es9p`] defines the SM-DP+ request and response bodies and the
//!   [`HttpClient`] contract; [`es11`] adds SM-DS event discovery
//! - [`bpp`] splits a bound profile package into the segments the card loads
//! - [`ActivationCode`] parses `LPA:1$...` codes
//!
//! The card is reached through any [`Transmitter`]; a
//! [`nexum_apdu_core::LogicalChannel`] is the usual one.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod activation_code;
pub mod bpp;
pub mod cancel;
pub mod client;
pub mod constants;
pub mod download;
pub mod es10a;
pub mod es10b;
pub mod es10c;
pub mod es11;
pub mod es9p;
pub mod transmitter;
pub mod types;

mod error;
pub use error::{Error, Result};

pub use activation_code::ActivationCode;
pub use cancel::CancellationToken;
pub use client::{Client, ClientOptions};
pub use download::{CallbackPolicy, DownloadOutcome, DownloadPolicy, DownloadStage};
pub use es11::EventEntry;
pub use es9p::{HttpClient, HttpRequest};
pub use transmitter::{CardRequest, Transmitter};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::types::{Eid, Iccid, Identifier, Imei, IsdpAid, ProfileInfo, TransactionId};
    pub use crate::{
        ActivationCode, CallbackPolicy, CancellationToken, CardRequest, Client, ClientOptions,
        DownloadOutcome, DownloadPolicy, DownloadStage, Error, EventEntry, HttpClient, HttpRequest,
        Result, Transmitter,
    };
}
