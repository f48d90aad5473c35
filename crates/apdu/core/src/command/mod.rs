//! APDU command definitions
//!
//! This module provides the short-form command APDU according to
//! ISO/IEC 7816-4: `CLA INS P1 P2 [Lc DATA] [Le]`.

pub mod error;

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

pub use error::CommandError;

/// Largest data field of a short command APDU
pub const MAX_DATA_LENGTH: usize = 255;

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<u8>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Set the command data; empty data is treated as absent
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        self.data = (!data.is_empty()).then_some(data);
        self
    }

    /// Set the expected response length
    pub const fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Address the command to a logical channel
    ///
    /// The channel number replaces the low nibble of the class byte.
    pub const fn with_channel(mut self, channel: u8) -> Self {
        self.cla = (self.cla & 0xF0) | (channel & 0x0F);
        self
    }

    /// Command data, empty if absent
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Length of the serialized command
    pub fn command_length(&self) -> usize {
        let data = match self.data().len() {
            0 => 0,
            len => 1 + len,
        };
        4 + data + usize::from(self.le.is_some())
    }

    /// Convert to raw APDU bytes
    pub fn to_bytes(&self) -> Result<Bytes, CommandError> {
        let data = self.data();
        if data.len() > MAX_DATA_LENGTH {
            return Err(CommandError::data_too_long(data.len(), MAX_DATA_LENGTH));
        }

        let mut buffer = BytesMut::with_capacity(self.command_length());
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);
        if !data.is_empty() {
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }
        if let Some(le) = self.le {
            buffer.put_u8(le);
        }
        Ok(buffer.freeze())
    }

    /// Parse a short command APDU
    pub fn from_bytes(raw: &[u8]) -> Result<Self, CommandError> {
        let [cla, ins, p1, p2, body @ ..] = raw else {
            return Err(CommandError::InvalidFormat("command shorter than header"));
        };
        let command = Self::new(*cla, *ins, *p1, *p2);
        match body {
            [] => Ok(command),
            [le] => Ok(command.with_le(*le)),
            [lc, rest @ ..] => {
                let lc = *lc as usize;
                match rest.len().checked_sub(lc) {
                    Some(0) => Ok(command.with_data(Bytes::copy_from_slice(rest))),
                    Some(1) => Ok(command
                        .with_data(Bytes::copy_from_slice(&rest[..lc]))
                        .with_le(rest[lc])),
                    _ => Err(CommandError::InvalidFormat("Lc inconsistent with body length")),
                }
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X} {:02X}",
            self.cla, self.ins, self.p1, self.p2
        )?;
        if !self.data().is_empty() {
            write!(f, " [{} bytes]", self.data().len())?;
        }
        if let Some(le) = self.le {
            write!(f, " Le={le:02X}")?;
        }
        Ok(())
    }
}
