//! Transport traits for APDU communication with cards
//!
//! A transport is the driver-side collaborator (PC/SC reader, modem AT
//! commands, MBIM, QMI and so on). It moves raw bytes and manages logical
//! channels; it has no knowledge of command chaining or TLV content.

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// Trait for card transports
pub trait CardTransport: Send + fmt::Debug {
    /// Error type returned by the transport
    type Error: Into<crate::Error> + fmt::Debug;

    /// Open the device and perform any reset or handshake it needs
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Release the device
    fn disconnect(&mut self) -> Result<(), Self::Error>;

    /// Open a logical channel and select `aid` on it, returning the channel number
    fn open_logical_channel(&mut self, aid: &[u8]) -> Result<u8, Self::Error>;

    /// Close a previously opened logical channel
    fn close_logical_channel(&mut self, channel: u8) -> Result<(), Self::Error>;

    /// Send raw APDU bytes to card and return response bytes
    ///
    /// This method should handle the low-level communication with the card
    /// but should not interpret the contents or handle protocol-specific
    /// operations like GET RESPONSE.
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error> {
        trace!(command = %hex::encode(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = ?e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    /// This is the method that concrete implementations should override
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error>;
}

#[cfg(test)]
pub(crate) use mock::MockTransport;
