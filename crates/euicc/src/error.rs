//! Error type for eUICC operations
//!
//! Card functions report failures through result codes inside their
//! response TLV. Those codes are mapped to [`Error::Card`] with the name the
//! GSMA definitions give them, so the failing function and reason are
//! visible without a trace.

use nexum_bertlv::Tag;

use crate::es9p::StatusCodeData;

/// Result type for eUICC operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for eUICC operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TLV encoding or decoding failed
    #[error(transparent)]
    Tlv(#[from] nexum_bertlv::Error),

    /// APDU exchange with the card failed
    #[error(transparent)]
    Apdu(#[from] nexum_apdu_core::Error),

    /// JSON body could not be encoded or decoded
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Server address could not be turned into a URL
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// HTTP collaborator failed
    #[error("http request failed: {0}")]
    Http(String),

    //
    // Card response errors
    //
    /// Response carried a different tag than the function answers with
    #[error("unexpected tag {actual}, expected {expected}")]
    UnexpectedTag {
        /// Tag of the function response
        expected: Tag,
        /// Tag the card answered with
        actual: Tag,
    },

    /// Required field missing from a response
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Card function answered with an error code
    #[error("{function} failed: {reason} ({code})")]
    Card {
        /// Card function name
        function: &'static str,
        /// Name of the result code
        reason: &'static str,
        /// Raw result code
        code: i64,
    },

    /// Profile installation failed inside the card
    #[error("load bound profile package failed at {command}: {reason}")]
    LoadBoundProfilePackage {
        /// Name of the `bppCommandId` that failed
        command: &'static str,
        /// Name of the `errorReason`
        reason: &'static str,
    },

    /// Bound profile package lacks required elements
    #[error("invalid bound profile package: missing {}", .0.join(", missing "))]
    InvalidBoundProfilePackage(Vec<&'static str>),

    //
    // Server errors
    //
    /// Server function did not execute successfully
    #[error("server function status {status}: {data}")]
    Server {
        /// Reported `functionExecutionStatus.status`
        status: String,
        /// Subject and reason codes
        data: StatusCodeData,
    },

    //
    // Input errors
    //
    /// Activation code could not be parsed or is incomplete
    #[error("invalid activation code: {0}")]
    InvalidActivationCode(&'static str),

    /// Identifier is not a valid ICCID, IMEI or AID
    #[error("invalid {kind}: {reason}")]
    InvalidIdentifier {
        /// Identifier kind
        kind: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Profile nickname is not acceptable to the card
    #[error("invalid nickname: {0}")]
    InvalidNickname(&'static str),

    /// Client options are out of range
    #[error("invalid client options: {0}")]
    InvalidOptions(String),

    //
    // Download errors
    //
    /// Profile needs a confirmation code and none was supplied
    #[error("confirmation code is required")]
    ConfirmationCodeRequired,

    /// Download failed and cancelling the session failed as well
    #[error("{source} (cancel session also failed: {cancel_error})")]
    Aborted {
        /// Failure that triggered the cancellation
        source: Box<Self>,
        /// Failure cancelling the session
        cancel_error: Box<Self>,
    },
}

impl Error {
    /// Build an HTTP collaborator error from any displayable failure
    pub fn http(error: impl std::fmt::Display) -> Self {
        Self::Http(error.to_string())
    }

    pub(crate) fn invalid_identifier(kind: &'static str, reason: &'static str) -> Self {
        Self::InvalidIdentifier { kind, reason }
    }

    pub(crate) fn check_tag(expected: Tag, actual: Tag) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::UnexpectedTag { expected, actual })
        }
    }
}
