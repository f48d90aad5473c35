//! Core error type for all APDU operations
//!
//! Errors from the transport, command encoding and response parsing are
//! folded into one [`Error`] so they bubble up through the logical channel
//! unchanged. [`ResultExt::context`] attaches the step that failed.

use crate::command::CommandError;
use crate::response::error::{ResponseError, StatusError};
use crate::response::status::StatusWord;
use crate::transport::TransportError;

/// Result type for APDU operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport collaborator failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Command could not be encoded
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Response could not be parsed
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Card answered with a status that is neither success nor more data
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Segment size outside the single APDU data range
    #[error("invalid segment size {0}, expected 1..=255")]
    InvalidSegmentSize(usize),

    /// Channel number does not fit the class byte
    #[error("invalid logical channel {0}, expected 0..=15")]
    InvalidChannel(u8),

    /// Nothing to send
    #[error("command is empty")]
    EmptyCommand,

    /// Command needs more segments than P2 can number
    #[error("command of {0} segments exceeds 256 segments")]
    TooManySegments(usize),

    /// Closing the session failed in both steps
    #[error("{source} (disconnect also failed: {secondary})")]
    Close {
        /// Failure closing the logical channel
        source: Box<Self>,
        /// Failure disconnecting the device
        secondary: Box<Self>,
    },

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Status word the card answered with, if this error carries one
    pub fn status_word(&self) -> Option<StatusWord> {
        match self {
            Self::Status(e) => Some(e.status),
            Self::Response(ResponseError::Status(e)) => Some(e.status),
            Self::Context { source, .. } | Self::Close { source, .. } => source.status_word(),
            _ => None,
        }
    }
}

/// Extension trait for Result with APDU Errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T, Error>;

    /// Add lazily built context to an error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, Error>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T, Error> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, Error> {
        self.map_err(|e| e.into().with_context(context()))
    }
}
