//! Error types specific to card transport

/// Transport error type
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to device")]
    Connection,

    /// Operation requires a connected device
    #[error("Device is not connected")]
    NotConnected,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// Card refused to open a logical channel
    #[error("Failed to open logical channel: {0}")]
    ChannelUnavailable(String),

    /// Driver error (with code)
    #[error("Driver error code: {0}")]
    Driver(i32),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Underlying device I/O failure
    #[error("Device I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new driver error
    pub const fn driver(code: i32) -> Self {
        Self::Driver(code)
    }

    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}
