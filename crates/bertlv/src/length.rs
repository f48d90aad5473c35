//! Definite-form length encoding
//!
//! Lengths below `0x80` are a single byte. Longer lengths use `81`, `82` or
//! `83` followed by one, two or three big-endian bytes. Nothing larger than
//! `0xFFFFFF` is representable.

use std::io::Read;

use crate::{Error, Result};

/// Largest length that can be encoded
pub const MAX_LENGTH: usize = 0xFF_FFFF;

/// Number of bytes needed to encode `length`
pub const fn encoded_len(length: usize) -> Result<usize> {
    match length {
        0..=0x7F => Ok(1),
        0x80..=0xFF => Ok(2),
        0x100..=0xFFFF => Ok(3),
        0x1_0000..=MAX_LENGTH => Ok(4),
        _ => Err(Error::LengthOverflow(length)),
    }
}

/// Append the encoding of `length` to `out`
pub fn encode(length: usize, out: &mut Vec<u8>) -> Result<()> {
    let size = encoded_len(length)?;
    if size == 1 {
        out.push(length as u8);
        return Ok(());
    }
    let count = size - 1;
    out.push(0x80 | count as u8);
    out.extend_from_slice(&(length as u32).to_be_bytes()[4 - count..]);
    Ok(())
}

/// Read a length from a byte stream, returning the length and bytes consumed
pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<(usize, usize)> {
    let mut leading = [0u8; 1];
    reader.read_exact(&mut leading)?;
    let count = match leading[0] {
        byte @ 0..=0x7F => return Ok((byte as usize, 1)),
        0x81 => 1,
        0x82 => 2,
        0x83 => 3,
        other => return Err(Error::UnsupportedLength(other)),
    };

    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf[4 - count..])?;
    Ok((u32::from_be_bytes(buf) as usize, 1 + count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn encoded(length: usize) -> Vec<u8> {
        let mut out = Vec::new();
        encode(length, &mut out).unwrap();
        out
    }

    #[test]
    fn test_encode_boundaries() {
        assert_eq!(encoded(0), hex!("00"));
        assert_eq!(encoded(127), hex!("7F"));
        assert_eq!(encoded(128), hex!("8180"));
        assert_eq!(encoded(255), hex!("81FF"));
        assert_eq!(encoded(256), hex!("820100"));
        assert_eq!(encoded(65535), hex!("82FFFF"));
        assert_eq!(encoded(65536), hex!("83010000"));
        assert_eq!(encoded(MAX_LENGTH), hex!("83FFFFFF"));
    }

    #[test]
    fn test_encode_overflow() {
        let mut out = Vec::new();
        assert!(matches!(
            encode(MAX_LENGTH + 1, &mut out),
            Err(Error::LengthOverflow(0x100_0000))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_forms() {
        assert_eq!(read(&mut &hex!("05")[..]).unwrap(), (5, 1));
        assert_eq!(read(&mut &hex!("8180")[..]).unwrap(), (128, 2));
        assert_eq!(read(&mut &hex!("820100")[..]).unwrap(), (256, 3));
        assert_eq!(read(&mut &hex!("83010000")[..]).unwrap(), (65536, 4));
    }

    #[test]
    fn test_read_unsupported_and_short() {
        assert!(matches!(
            read(&mut &hex!("80")[..]),
            Err(Error::UnsupportedLength(0x80))
        ));
        assert!(matches!(
            read(&mut &hex!("8401000000")[..]),
            Err(Error::UnsupportedLength(0x84))
        ));
        assert!(matches!(read(&mut &hex!("8201")[..]), Err(Error::Io(_))));
        assert!(matches!(read(&mut &[0u8; 0][..]), Err(Error::Io(_))));
    }
}
