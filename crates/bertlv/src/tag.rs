//! BER tag encoding
//!
//! A tag packs the class (bits 8-7), the form (bit 6) and the tag number of a
//! TLV into one or more bytes. Numbers below 31 fit in the first byte; larger
//! numbers set the low five bits to `1F` and follow with a base-128 sequence
//! where every byte except the last has its high bit set.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};

use subtle::ConstantTimeEq;

use crate::{Error, Result};

/// Maximum number of bytes a tag may occupy
pub const MAX_TAG_LENGTH: usize = 11;

const NUMBER_MASK: u8 = 0x1F;
const CONSTRUCTED_BIT: u8 = 0x20;
const CLASS_MASK: u8 = 0xC0;
const CONTINUATION_BIT: u8 = 0x80;

/// Tag class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Class {
    /// Universal class (ASN.1 built-in types)
    Universal = 0x00,
    /// Application class
    Application = 0x40,
    /// Context-specific class
    ContextSpecific = 0x80,
    /// Private class
    Private = 0xC0,
}

impl Class {
    /// Build a primitive tag of this class
    pub const fn primitive(self, number: u64) -> Tag {
        Tag::new(self, Form::Primitive, number)
    }

    /// Build a constructed tag of this class
    pub const fn constructed(self, number: u64) -> Tag {
        Tag::new(self, Form::Constructed, number)
    }

    const fn from_leading(byte: u8) -> Self {
        match byte & CLASS_MASK {
            0x00 => Self::Universal,
            0x40 => Self::Application,
            0x80 => Self::ContextSpecific,
            _ => Self::Private,
        }
    }
}

/// Tag form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Form {
    /// Node carries a flat byte value
    Primitive = 0x00,
    /// Node carries an ordered list of children
    Constructed = CONSTRUCTED_BIT,
}

/// An encoded BER tag
///
/// Tags are immutable and stored inline, so copying one never allocates.
/// Equality is evaluated in constant time over the encoded bytes.
#[derive(Clone, Copy)]
pub struct Tag {
    bytes: [u8; MAX_TAG_LENGTH],
    len: u8,
}

impl Tag {
    /// Encode a tag from its class, form and number
    pub const fn new(class: Class, form: Form, number: u64) -> Self {
        let mut bytes = [0u8; MAX_TAG_LENGTH];
        let leading = class as u8 | form as u8;
        if number < NUMBER_MASK as u64 {
            bytes[0] = leading | number as u8;
            return Self { bytes, len: 1 };
        }
        bytes[0] = leading | NUMBER_MASK;

        let mut digits = 1;
        let mut rest = number >> 7;
        while rest > 0 {
            digits += 1;
            rest >>= 7;
        }

        let mut i = 0;
        while i < digits {
            let shift = 7 * (digits - 1 - i);
            let mut byte = ((number >> shift) & 0x7F) as u8;
            if i + 1 < digits {
                byte |= CONTINUATION_BIT;
            }
            bytes[1 + i] = byte;
            i += 1;
        }
        Self {
            bytes,
            len: (1 + digits) as u8,
        }
    }

    /// Parse a tag from bytes that must contain exactly one tag
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = data;
        let (tag, consumed) = Self::read_from(&mut reader)?;
        if consumed != data.len() {
            return Err(Error::MalformedTag("trailing bytes after tag"));
        }
        Ok(tag)
    }

    /// Read a tag from a byte stream, returning the tag and bytes consumed
    ///
    /// At most [`MAX_TAG_LENGTH`] bytes are consumed before the tag is
    /// rejected as malformed.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<(Self, usize)> {
        let mut tag = Self {
            bytes: [0u8; MAX_TAG_LENGTH],
            len: 1,
        };
        reader.read_exact(&mut tag.bytes[..1])?;
        if tag.bytes[0] & NUMBER_MASK != NUMBER_MASK {
            return Ok((tag, 1));
        }

        loop {
            let index = tag.len as usize;
            if index == MAX_TAG_LENGTH {
                return Err(Error::TagTooLong);
            }
            reader.read_exact(&mut tag.bytes[index..=index])?;
            tag.len += 1;
            if tag.bytes[index] & CONTINUATION_BIT == 0 {
                return Ok((tag, tag.len as usize));
            }
        }
    }

    /// Write the encoded tag, returning bytes written
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(self.as_bytes())?;
        Ok(self.len())
    }

    /// Encoded tag bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Number of encoded bytes
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Tag class
    pub const fn class(&self) -> Class {
        Class::from_leading(self.bytes[0])
    }

    /// Tag form
    pub const fn form(&self) -> Form {
        if self.is_constructed() { Form::Constructed } else { Form::Primitive }
    }

    /// Whether the tag denotes a constructed node
    pub const fn is_constructed(&self) -> bool {
        self.bytes[0] & CONSTRUCTED_BIT != 0
    }

    /// Whether the tag denotes a primitive node
    pub const fn is_primitive(&self) -> bool {
        !self.is_constructed()
    }

    /// Tag number, or `None` if it does not fit in 64 bits
    pub fn number(&self) -> Option<u64> {
        let leading = self.bytes[0] & NUMBER_MASK;
        if leading != NUMBER_MASK {
            return Some(leading as u64);
        }
        self.as_bytes()[1..].iter().try_fold(0u64, |number, byte| {
            number
                .checked_mul(128)
                .map(|number| number | (byte & 0x7F) as u64)
        })
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.as_bytes().ct_eq(other.as_bytes()))
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl TryFrom<&[u8]> for Tag {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        Self::from_bytes(data)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}
