//! Error type for BER-TLV encoding and decoding
//!
//! Every failure in this crate is fatal to the operation that produced it.
//! Errors raised while reading a child node are wrapped with the enclosing
//! tag, so a failure deep inside a tree reads like `BF36: A1: 88: ...`.

use crate::length::MAX_LENGTH;
use crate::tag::{MAX_TAG_LENGTH, Tag};

/// Result type for BER-TLV operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core error type for BER-TLV operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    //
    // Tag and length errors
    //
    /// Tag continuation sequence ran past the maximum tag size
    #[error("malformed tag: encoding exceeds {MAX_TAG_LENGTH} bytes")]
    TagTooLong,

    /// Tag bytes do not form exactly one tag
    #[error("malformed tag: {0}")]
    MalformedTag(&'static str),

    /// Leading length byte is not one of the supported definite forms
    #[error("unsupported length encoding: {0:#04X}")]
    UnsupportedLength(u8),

    /// Length does not fit the three byte long form
    #[error("length {0} exceeds maximum encodable length {MAX_LENGTH}")]
    LengthOverflow(usize),

    //
    // Tree errors
    //
    /// A constructed tag was given a direct value
    #[error("constructed tag {0} cannot carry a value")]
    ConstructedWithValue(Tag),

    /// A primitive tag was given children
    #[error("primitive tag {0} cannot carry children")]
    PrimitiveWithChildren(Tag),

    /// Children of a constructed node do not add up to its declared length
    #[error("children of {tag} span {actual} bytes, declared length is {declared}")]
    LengthMismatch {
        /// Tag of the constructed node
        tag: Tag,
        /// Declared content length
        declared: usize,
        /// Bytes consumed by the children
        actual: usize,
    },

    /// Value ended before its declared length
    #[error("truncated value: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Declared value length
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Constructed nodes nested beyond the supported depth
    #[error("nesting exceeds {0} levels")]
    TooDeep(usize),

    /// Error raised while processing the contents of a tag
    #[error("{tag}: {source}")]
    InTag {
        /// Enclosing tag
        tag: Tag,
        /// Underlying error
        source: Box<Self>,
    },

    //
    // Value errors
    //
    /// Integer value is wider than its target type
    #[error("integer of {actual} bytes does not fit in {width} bytes")]
    IntegerOverflow {
        /// Byte width of the target type
        width: usize,
        /// Length of the encoded value
        actual: usize,
    },

    /// Boolean value is not exactly one byte
    #[error("invalid boolean encoding of {0} bytes")]
    InvalidBoolean(usize),

    /// Bit string is empty or has an invalid unused-bits count
    #[error("invalid bit string: {0}")]
    InvalidBitString(&'static str),

    /// Value is not valid UTF-8 text
    #[error("invalid UTF-8 value: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    //
    // I/O and text form errors
    //
    /// Underlying reader or writer failed (including short reads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text form is not valid base64
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Wrap this error with the tag that was being processed
    pub fn in_tag(self, tag: Tag) -> Self {
        Self::InTag {
            tag,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any tag wrappers
    pub fn root(&self) -> &Self {
        match self {
            Self::InTag { source, .. } => source.root(),
            other => other,
        }
    }
}
