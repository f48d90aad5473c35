//! Error types specific to APDU commands

/// Error for APDU command encoding and parsing
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Raw command does not match any ISO 7816-4 case
    #[error("Invalid command format: {0}")]
    InvalidFormat(&'static str),

    /// Data does not fit a short APDU
    #[error("Data too long: {0} bytes (max {1})")]
    DataTooLong(usize, usize),
}

impl CommandError {
    /// Create a data too long error
    pub const fn data_too_long(actual: usize, max: usize) -> Self {
        Self::DataTooLong(actual, max)
    }
}
