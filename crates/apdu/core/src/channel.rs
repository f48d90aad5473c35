//! Logical channel session
//!
//! [`LogicalChannel`] owns a connected transport and one logical channel on
//! the card. Outbound commands of any size are split into STORE DATA segments
//! of at most the maximum segment size, and chained `61XX` responses are
//! drained with GET RESPONSE until the card reports `9000`.
//!
//! Every exchange holds the session lock from the first segment until the
//! last response byte has been collected, so concurrent callers block rather
//! than interleave.

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, instrument, trace, warn};

use crate::command::{Command, MAX_DATA_LENGTH};
use crate::constants::{cla, ins, store_data};
use crate::response::Response;
use crate::response::error::StatusError;
use crate::transport::CardTransport;
use crate::{Error, Result, ResultExt};

/// Highest logical channel number addressable in the class byte
pub const MAX_CHANNEL: u8 = 0x0F;

#[derive(Debug)]
struct Session<T> {
    transport: T,
    buffer: Vec<u8>,
}

/// A connected logical channel session
#[derive(Debug)]
pub struct LogicalChannel<T: CardTransport> {
    session: Mutex<Session<T>>,
    channel: u8,
    mss: usize,
}

impl<T: CardTransport> LogicalChannel<T> {
    /// Connect the transport and open a logical channel selecting `aid`
    ///
    /// `mss` is the largest data field sent per segment, between 1 and 255.
    /// If the channel cannot be opened the device is disconnected again.
    pub fn open(mut transport: T, aid: &[u8], mss: usize) -> Result<Self> {
        if !(1..=MAX_DATA_LENGTH).contains(&mss) {
            return Err(Error::InvalidSegmentSize(mss));
        }
        transport.connect().context("connect")?;

        let opened = transport
            .open_logical_channel(aid)
            .context("open logical channel")
            .and_then(|channel| {
                if channel > MAX_CHANNEL {
                    Err(Error::InvalidChannel(channel))
                } else {
                    Ok(channel)
                }
            });
        let channel = match opened {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(disconnect) = transport.disconnect() {
                    warn!(error = ?disconnect, "Failed to disconnect after open failure");
                }
                return Err(e);
            }
        };

        debug!(channel, aid = %hex::encode(aid), mss, "Opened logical channel");
        Ok(Self {
            session: Mutex::new(Session {
                transport,
                buffer: Vec::new(),
            }),
            channel,
            mss,
        })
    }

    /// Logical channel number
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Maximum segment size
    pub const fn mss(&self) -> usize {
        self.mss
    }

    /// Send a command of any size and collect the full response
    ///
    /// The response replaces any unread data from a previous write and is
    /// returned by [`LogicalChannel::read`].
    pub fn write(&self, command: &[u8]) -> Result<()> {
        let mut session = self.session.lock();
        session.buffer.clear();
        let response = self.exchange(&mut session.transport, command)?;
        session.buffer = response;
        Ok(())
    }

    /// Drain the response collected by the most recent write
    pub fn read(&self) -> Vec<u8> {
        std::mem::take(&mut self.session.lock().buffer)
    }

    /// Write a command and read its response under one lock
    pub fn transmit(&self, command: &[u8]) -> Result<Vec<u8>> {
        let mut session = self.session.lock();
        session.buffer.clear();
        self.exchange(&mut session.transport, command)
    }

    #[instrument(level = "trace", skip_all, fields(channel = self.channel, len = command.len()))]
    fn exchange(&self, transport: &mut T, command: &[u8]) -> Result<Vec<u8>> {
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }
        let count = command.len().div_ceil(self.mss);
        if count > usize::from(u8::MAX) + 1 {
            return Err(Error::TooManySegments(count));
        }

        let mut response = Vec::new();
        for (index, segment) in command.chunks(self.mss).enumerate() {
            let p1 = if index + 1 == count {
                store_data::P1_LAST_BLOCK
            } else {
                store_data::P1_MORE_BLOCKS
            };
            trace!(segment = index, count, p1 = format_args!("{p1:#04X}"), "Sending segment");
            let store_data = Command::new(cla::GP, ins::STORE_DATA, p1, index as u8)
                .with_data(Bytes::copy_from_slice(segment));
            let data = self
                .send_chained(transport, store_data)
                .with_context(|| format!("segment {} of {count}", index + 1))?;
            response.extend_from_slice(&data);
        }
        Ok(response)
    }

    /// Send one command and follow any GET RESPONSE chain it starts
    fn send_chained(&self, transport: &mut T, command: Command) -> Result<Vec<u8>> {
        let mut response = self.send(transport, command)?;
        let mut data = Vec::new();
        loop {
            data.extend_from_slice(response.payload());
            let status = response.status();
            if status.is_success() {
                return Ok(data);
            }
            let Some(remaining) = status.remaining_bytes() else {
                return Err(StatusError::from(status).into());
            };
            trace!(remaining, "Sending GET RESPONSE command");
            let get_response =
                Command::new_with_le(cla::GP, ins::GET_RESPONSE, 0x00, 0x00, remaining);
            response = self.send(transport, get_response)?;
        }
    }

    fn send(&self, transport: &mut T, command: Command) -> Result<Response> {
        let raw = command.with_channel(self.channel).to_bytes()?;
        let reply = transport.transmit_raw(&raw).map_err(Into::into)?;
        Ok(Response::from_bytes(&reply)?)
    }

    /// Close the logical channel and disconnect the device
    ///
    /// Both steps are attempted. If both fail the channel error is returned
    /// with the disconnect error attached.
    pub fn close(self) -> Result<()> {
        let mut session = self.session.into_inner();
        let closed = session
            .transport
            .close_logical_channel(self.channel)
            .context("close logical channel");
        let disconnected = session.transport.disconnect().context("disconnect");
        debug!(channel = self.channel, "Closed logical channel");

        match (closed, disconnected) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(primary), Err(secondary)) => {
                warn!(error = %secondary, "Disconnect failed after channel close failure");
                Err(Error::Close {
                    source: Box::new(primary),
                    secondary: Box::new(secondary),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use hex_literal::hex;
    use std::sync::Arc;

    const ISD_R: [u8; 16] = hex!("A0000005591010FFFFFFFF8900000100");

    fn open(transport: MockTransport, mss: usize) -> LogicalChannel<MockTransport> {
        LogicalChannel::open(transport, &ISD_R, mss).unwrap()
    }

    fn sent(channel: LogicalChannel<MockTransport>) -> Vec<Command> {
        channel
            .session
            .into_inner()
            .transport
            .commands
            .iter()
            .map(|raw| Command::from_bytes(raw).unwrap())
            .collect()
    }

    #[test]
    fn test_write_splits_into_segments() {
        let transport = MockTransport::new([&hex!("9000")[..], &hex!("9000"), &hex!("AABB9000")]);
        let channel = open(transport, 8);
        let command: Vec<u8> = (0u8..20).collect();

        channel.write(&command).unwrap();
        assert_eq!(channel.read(), hex!("AABB"));
        assert!(channel.read().is_empty());

        let commands = sent(channel);
        assert_eq!(commands.len(), 3);
        let params: Vec<(u8, u8)> = commands.iter().map(|c| (c.p1, c.p2)).collect();
        assert_eq!(params, vec![(0x11, 0), (0x11, 1), (0x91, 2)]);
        assert!(commands.iter().all(|c| c.cla == 0x81 && c.ins == 0xE2));
        let data: Vec<u8> = commands.iter().flat_map(|c| c.data().to_vec()).collect();
        assert_eq!(data, command);
    }

    #[test]
    fn test_exact_multiple_marks_last_segment() {
        let transport = MockTransport::new([hex!("9000"), hex!("9000")]);
        let channel = open(transport, 4);
        channel.write(&[0u8; 8]).unwrap();
        let commands = sent(channel);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].p1, 0x91);
    }

    #[test]
    fn test_get_response_chaining() {
        let transport = MockTransport::new([
            hex!("6105").to_vec(),
            hex!("0102030405 6103").to_vec(),
            hex!("060708 9000").to_vec(),
        ]);
        let channel = open(transport, 255);

        let response = channel.transmit(&hex!("BF2E00")).unwrap();
        assert_eq!(response, hex!("0102030405060708"));

        let commands = sent(channel);
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[1].ins, 0xC0);
        assert_eq!(commands[1].cla, 0x81);
        assert_eq!(commands[1].le, Some(0x05));
        assert_eq!(commands[2].le, Some(0x03));
    }

    #[test]
    fn test_error_status_aborts_write() {
        let transport = MockTransport::new([hex!("9000"), hex!("6A80"), hex!("9000")]);
        let channel = open(transport, 2);
        let err = channel.write(&hex!("0102030405")).unwrap_err();
        assert_eq!(err.status_word().map(|sw| sw.to_u16()), Some(0x6A80));
        assert!(err.to_string().starts_with("segment 2 of 3"));
        assert_eq!(sent(channel).len(), 2);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            LogicalChannel::open(MockTransport::empty(), &ISD_R, 0),
            Err(Error::InvalidSegmentSize(0))
        ));
        assert!(matches!(
            LogicalChannel::open(MockTransport::empty(), &ISD_R, 256),
            Err(Error::InvalidSegmentSize(256))
        ));

        let channel = open(MockTransport::empty(), 8);
        assert!(matches!(channel.write(&[]), Err(Error::EmptyCommand)));
        assert!(matches!(
            channel.write(&vec![0u8; 8 * 257]),
            Err(Error::TooManySegments(257))
        ));
    }

    #[test]
    fn test_open_failure_disconnects() {
        let transport = MockTransport {
            fail_open: true,
            ..MockTransport::empty()
        };
        let err = LogicalChannel::open(transport, &ISD_R, 8).unwrap_err();
        assert!(err.to_string().starts_with("open logical channel"));

        let transport = MockTransport {
            channel: 16,
            ..MockTransport::empty()
        };
        assert!(matches!(
            LogicalChannel::open(transport, &ISD_R, 8),
            Err(Error::InvalidChannel(16))
        ));
    }

    #[test]
    fn test_close_attempts_both_steps() {
        let channel = open(MockTransport::empty(), 8);
        channel.close().unwrap();

        let transport = MockTransport {
            fail_close: true,
            fail_disconnect: true,
            ..MockTransport::empty()
        };
        let err = open(transport, 8).close().unwrap_err();
        let Error::Close { source, secondary } = err else {
            panic!("expected close error");
        };
        assert!(source.to_string().contains("close failed"));
        assert!(secondary.to_string().contains("disconnect failed"));

        let transport = MockTransport {
            fail_close: true,
            ..MockTransport::empty()
        };
        let err = open(transport, 8).close().unwrap_err();
        assert!(err.to_string().starts_with("close logical channel"));
    }

    #[test]
    fn test_concurrent_writers_do_not_interleave() {
        let responses = (0..8).flat_map(|_| [hex!("6101").to_vec(), hex!("AA9000").to_vec()]);
        let channel = Arc::new(open(MockTransport::new(responses), 255));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let channel = Arc::clone(&channel);
                std::thread::spawn(move || channel.transmit(&hex!("BF2000")).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), hex!("AA"));
        }

        let channel = Arc::into_inner(channel).unwrap();
        let commands = sent(channel);
        for pair in commands.chunks(2) {
            assert_eq!(pair[0].ins, 0xE2);
            assert_eq!(pair[1].ins, 0xC0);
        }
    }
}
