//! Card request plumbing
//!
//! Every ES10 function is a [`CardRequest`]: it knows how to encode itself as
//! a TLV and how to read the card's answer. A [`Transmitter`] moves the bytes,
//! normally a [`LogicalChannel`] opened on the ISD-R.

use nexum_apdu_core::{CardTransport, LogicalChannel};
use nexum_bertlv::Tlv;
use tracing::trace;

use crate::Result;

/// An ES10 card function
pub trait CardRequest {
    /// Parsed answer
    type Response;

    /// Encode the request
    fn to_tlv(&self) -> Result<Tlv>;

    /// Parse and check the card's answer
    ///
    /// Result codes other than success are returned as errors.
    fn parse_response(&self, response: Tlv) -> Result<Self::Response>;
}

/// Something that can exchange complete commands with the eUICC
pub trait Transmitter {
    /// Send a command of any size and return the full response data
    fn transmit_raw(&self, command: &[u8]) -> Result<Vec<u8>>;

    /// Send a card request and parse its response
    fn invoke<R: CardRequest>(&self, request: &R) -> Result<R::Response>
    where
        Self: Sized,
    {
        let command = request.to_tlv()?;
        trace!(tag = %command.tag(), "Invoking card function");
        let response = self.transmit_raw(&command.to_bytes()?)?;
        request.parse_response(Tlv::from_bytes(&response)?)
    }
}

impl<T: CardTransport> Transmitter for LogicalChannel<T> {
    fn transmit_raw(&self, command: &[u8]) -> Result<Vec<u8>> {
        Ok(self.transmit(command)?)
    }
}

impl<X: Transmitter> Transmitter for &X {
    fn transmit_raw(&self, command: &[u8]) -> Result<Vec<u8>> {
        (**self).transmit_raw(command)
    }
}
