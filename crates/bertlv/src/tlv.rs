//! TLV tree model
//!
//! A [`Tlv`] is either a primitive node owning a flat value or a constructed
//! node owning an ordered list of children. The form is fixed by the tag and
//! enforced by every constructor, and checked again before anything is
//! written.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::length;
use crate::primitive::{DecodeValue, EncodeValue};
use crate::tag::Tag;
use crate::{Error, Result};

/// Deepest constructed nesting accepted when reading
pub const MAX_DEPTH: usize = 64;

/// A BER-TLV node
///
/// Cloning a node copies the whole subtree, so the clone never shares
/// storage with the buffer it was parsed from.
#[derive(Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    value: Vec<u8>,
    children: Vec<Self>,
}

impl Tlv {
    /// Build a primitive node
    ///
    /// Fails if `tag` is constructed.
    pub fn primitive(tag: Tag, value: impl Into<Vec<u8>>) -> Result<Self> {
        if tag.is_constructed() {
            return Err(Error::ConstructedWithValue(tag));
        }
        Ok(Self {
            tag,
            value: value.into(),
            children: Vec::new(),
        })
    }

    /// Build a constructed node from its children
    ///
    /// Fails if `tag` is primitive.
    pub fn constructed(tag: Tag, children: impl IntoIterator<Item = Self>) -> Result<Self> {
        if tag.is_primitive() {
            return Err(Error::PrimitiveWithChildren(tag));
        }
        Ok(Self {
            tag,
            value: Vec::new(),
            children: children.into_iter().collect(),
        })
    }

    /// Build a primitive node from a typed value
    pub fn encode<T: EncodeValue + ?Sized>(tag: Tag, value: &T) -> Result<Self> {
        Self::primitive(tag, value.encode_value())
    }

    /// Start building a constructed node child by child
    pub fn builder(tag: Tag) -> Builder {
        Builder::new(tag)
    }

    /// Decode the value of a primitive node
    pub fn decode<T: DecodeValue>(&self) -> Result<T> {
        if self.tag.is_constructed() {
            return Err(Error::ConstructedWithValue(self.tag));
        }
        T::decode_value(&self.value).map_err(|e| e.in_tag(self.tag))
    }

    /// Node tag
    pub const fn tag(&self) -> Tag {
        self.tag
    }

    /// Value of a primitive node; empty for constructed nodes
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Children of a constructed node; empty for primitive nodes
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Take ownership of the value
    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// Take ownership of the children
    pub fn into_children(self) -> Vec<Self> {
        self.children
    }

    /// Whether this is a constructed node
    pub const fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: Tag) -> Option<&Self> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Direct children with the given tag, in order
    pub fn children_with(&self, tag: Tag) -> impl Iterator<Item = &Self> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// First descendant with the given tag, depth first
    ///
    /// The node itself is not considered.
    pub fn first(&self, tag: Tag) -> Option<&Self> {
        self.children.iter().find_map(|child| {
            if child.tag == tag {
                Some(child)
            } else {
                child.first(tag)
            }
        })
    }

    /// Follow a path of direct child tags
    ///
    /// An empty path returns the node itself.
    pub fn select(&self, path: &[Tag]) -> Option<&Self> {
        path.iter().try_fold(self, |node, tag| node.child(*tag))
    }

    /// Length of the encoded content (value or children)
    pub fn content_len(&self) -> Result<usize> {
        let len = if self.tag.is_constructed() {
            self.children
                .iter()
                .try_fold(0usize, |sum, child| Ok::<_, Error>(sum + child.encoded_len()?))?
        } else {
            self.value.len()
        };
        if len > length::MAX_LENGTH {
            return Err(Error::LengthOverflow(len).in_tag(self.tag));
        }
        Ok(len)
    }

    /// Total encoded size including tag and length
    pub fn encoded_len(&self) -> Result<usize> {
        let content = self.content_len()?;
        Ok(self.tag.len() + length::encoded_len(content)? + content)
    }

    /// Encoded tag and length, without the content
    pub fn header(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.tag.len() + 4);
        out.extend_from_slice(self.tag.as_bytes());
        length::encode(self.content_len()?, &mut out)?;
        Ok(out)
    }

    fn check_form(&self) -> Result<()> {
        if self.tag.is_constructed() && !self.value.is_empty() {
            return Err(Error::ConstructedWithValue(self.tag));
        }
        if self.tag.is_primitive() && !self.children.is_empty() {
            return Err(Error::PrimitiveWithChildren(self.tag));
        }
        Ok(())
    }

    /// Write the encoded node, returning bytes written
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize> {
        self.check_form()?;
        let header = self.header()?;
        writer.write_all(&header)?;
        let mut written = header.len();
        if self.tag.is_constructed() {
            for child in &self.children {
                written += child.write_to(writer).map_err(|e| e.in_tag(self.tag))?;
            }
        } else {
            writer.write_all(&self.value)?;
            written += self.value.len();
        }
        Ok(written)
    }

    /// Encode the node to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len()?);
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Read one node from a byte stream, returning the node and bytes consumed
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<(Self, usize)> {
        Self::read_nested(reader, 0)
    }

    fn read_nested<R: Read + ?Sized>(reader: &mut R, depth: usize) -> Result<(Self, usize)> {
        let (tag, tag_len) = Tag::read_from(reader)?;
        let (length, length_len) = length::read(reader).map_err(|e| e.in_tag(tag))?;
        let header_len = tag_len + length_len;

        if tag.is_primitive() {
            let mut value = Vec::new();
            reader
                .take(length as u64)
                .read_to_end(&mut value)
                .map_err(|e| Error::from(e).in_tag(tag))?;
            if value.len() != length {
                return Err(Error::Truncated {
                    expected: length,
                    actual: value.len(),
                }
                .in_tag(tag));
            }
            return Ok((
                Self {
                    tag,
                    value,
                    children: Vec::new(),
                },
                header_len + length,
            ));
        }

        if depth >= MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH).in_tag(tag));
        }
        let mut children = Vec::new();
        let mut consumed = 0;
        while consumed < length {
            let (child, read) = Self::read_nested(reader, depth + 1).map_err(|e| e.in_tag(tag))?;
            consumed += read;
            children.push(child);
        }
        if consumed != length {
            return Err(Error::LengthMismatch {
                tag,
                declared: length,
                actual: consumed,
            });
        }
        Ok((
            Self {
                tag,
                value: Vec::new(),
                children,
            },
            header_len + length,
        ))
    }

    /// Parse one node from the front of `data`, returning it with the rest
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        let (tlv, consumed) = Self::read_from(&mut &data[..])?;
        Ok((tlv, &data[consumed..]))
    }

    /// Parse one node from `data`
    ///
    /// Bytes following the node are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (tlv, rest) = Self::parse(data)?;
        if !rest.is_empty() {
            debug!(tag = %tlv.tag, trailing = rest.len(), "Ignoring bytes after TLV");
        }
        Ok(tlv)
    }

    /// Standard base64 text form of the encoded node
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    /// Parse a node from its standard base64 text form
    pub fn from_base64(text: &str) -> Result<Self> {
        Self::from_bytes(&STANDARD.decode(text)?)
    }
}

impl fmt::Debug for Tlv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag.is_constructed() {
            f.debug_struct("Tlv")
                .field("tag", &self.tag)
                .field("children", &self.children)
                .finish()
        } else {
            f.debug_struct("Tlv")
                .field("tag", &self.tag)
                .field("value", &format_args!("{}", HexBytes(&self.value)))
                .finish()
        }
    }
}

struct HexBytes<'a>(&'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02X}"))
    }
}

impl FromStr for Tlv {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::from_base64(text)
    }
}

impl TryFrom<&[u8]> for Tlv {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        Self::from_bytes(data)
    }
}

impl Serialize for Tlv {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.to_base64().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Tlv {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(serde::de::Error::custom)
    }
}

/// Ordered builder for constructed nodes
///
/// Children are appended in call order. Optional children are skipped when
/// absent, and the first construction error is reported by [`Builder::build`].
#[derive(Debug)]
#[must_use = "a builder does nothing until `build` is called"]
pub struct Builder {
    tag: Tag,
    children: Vec<Tlv>,
    error: Option<Error>,
}

impl Builder {
    /// Start a constructed node with the given tag
    pub const fn new(tag: Tag) -> Self {
        Self {
            tag,
            children: Vec::new(),
            error: None,
        }
    }

    fn push_result(mut self, child: Result<Tlv>) -> Self {
        match child {
            Ok(child) => self.children.push(child),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Append a child
    pub fn child(mut self, child: Tlv) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child if present
    pub fn child_opt(mut self, child: Option<Tlv>) -> Self {
        self.children.extend(child);
        self
    }

    /// Append several children
    pub fn children(mut self, children: impl IntoIterator<Item = Tlv>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a child built elsewhere, deferring its error
    pub fn child_result(self, child: Result<Tlv>) -> Self {
        self.push_result(child)
    }

    /// Append a primitive child
    pub fn primitive(self, tag: Tag, value: impl Into<Vec<u8>>) -> Self {
        self.push_result(Tlv::primitive(tag, value))
    }

    /// Append a primitive child holding an encoded value
    pub fn encode<T: EncodeValue + ?Sized>(self, tag: Tag, value: &T) -> Self {
        self.push_result(Tlv::encode(tag, value))
    }

    /// Append a primitive child holding an encoded value, if present
    pub fn encode_opt<T: EncodeValue>(self, tag: Tag, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.encode(tag, value),
            None => self,
        }
    }

    /// Finish the node
    pub fn build(self) -> Result<Tlv> {
        if let Some(e) = self.error {
            return Err(e.in_tag(self.tag));
        }
        Tlv::constructed(self.tag, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Class;
    use hex_literal::hex;

    const SEQUENCE: Tag = Class::Universal.constructed(16);
    const CTX0: Tag = Class::ContextSpecific.primitive(0);
    const CTX1: Tag = Class::ContextSpecific.primitive(1);

    #[test]
    fn test_primitive_round_trip() {
        let tlv = Tlv::primitive(CTX0, hex!("0102")).unwrap();
        let bytes = tlv.to_bytes().unwrap();
        assert_eq!(bytes, hex!("80020102"));
        assert_eq!(Tlv::from_bytes(&bytes).unwrap(), tlv);
    }

    #[test]
    fn test_constructed_round_trip() {
        let tlv = Tlv::builder(Class::ContextSpecific.constructed(56))
            .primitive(CTX0, hex!("AA"))
            .child(Tlv::constructed(SEQUENCE, [Tlv::primitive(CTX1, []).unwrap()]).unwrap())
            .build()
            .unwrap();
        let bytes = tlv.to_bytes().unwrap();
        assert_eq!(bytes, hex!("BF3807 8001AA 30028100"));
        let (parsed, consumed) = Tlv::read_from(&mut &bytes[..]).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(parsed, tlv);
        assert_eq!(parsed.children().len(), 2);
        assert_eq!(parsed.encoded_len().unwrap(), bytes.len());
    }

    #[test]
    fn test_long_form_lengths_round_trip() {
        for (size, header) in [
            (128usize, &hex!("04 8180")[..]),
            (256, &hex!("04 820100")[..]),
            (65536, &hex!("04 83010000")[..]),
        ] {
            let tlv = Tlv::primitive(Class::Universal.primitive(4), vec![0x5A; size]).unwrap();
            let bytes = tlv.to_bytes().unwrap();
            assert_eq!(&bytes[..header.len()], header);
            assert_eq!(bytes.len(), header.len() + size);
            assert_eq!(Tlv::from_bytes(&bytes).unwrap(), tlv);
        }
    }

    #[test]
    fn test_multi_byte_tag_round_trip() {
        let tag = Class::Private.constructed(300);
        let tlv = Tlv::constructed(tag, [Tlv::primitive(Class::Application.primitive(73), hex!("04")).unwrap()])
            .unwrap();
        let bytes = tlv.to_bytes().unwrap();
        assert_eq!(bytes, hex!("FF822C 04 5F490104"));
        assert_eq!(Tlv::from_bytes(&bytes).unwrap(), tlv);
    }

    #[test]
    fn test_form_invariants() {
        assert!(matches!(
            Tlv::primitive(SEQUENCE, hex!("00")),
            Err(Error::ConstructedWithValue(_))
        ));
        assert!(matches!(
            Tlv::constructed(CTX0, []),
            Err(Error::PrimitiveWithChildren(_))
        ));
        let err = Tlv::builder(SEQUENCE).primitive(SEQUENCE, []).build().unwrap_err();
        assert!(matches!(err.root(), Error::ConstructedWithValue(_)));
    }

    #[test]
    fn test_builder_skips_absent_children() {
        let tlv = Tlv::builder(SEQUENCE)
            .child_opt(None)
            .encode_opt::<i64>(CTX0, None)
            .encode(CTX1, &5i64)
            .child_opt(None)
            .build()
            .unwrap();
        assert_eq!(tlv.to_bytes().unwrap(), hex!("3003810105"));
    }

    #[test]
    fn test_oversized_constructed_node_fails() {
        let half = Tlv::primitive(Class::Universal.primitive(4), vec![0u8; 0x80_0000]).unwrap();
        let tlv = Tlv::constructed(SEQUENCE, [half.clone(), half]).unwrap();
        let err = tlv.to_bytes().unwrap_err();
        assert!(matches!(err.root(), Error::LengthOverflow(_)));
    }

    #[test]
    fn test_short_reads_carry_tag_context() {
        let err = Tlv::from_bytes(&hex!("BF3805 8003AA")).unwrap_err();
        assert_eq!(err.to_string(), "BF38: 80: truncated value: expected 3 bytes, got 1");

        let err = Tlv::from_bytes(&hex!("BF38")).unwrap_err();
        assert!(matches!(err, Error::InTag { .. }));

        let err = Tlv::from_bytes(&hex!("3004 8003AABBCC")).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { declared: 4, actual: 5, .. }));
    }

    #[test]
    fn test_depth_limit() {
        let mut tlv = Tlv::primitive(CTX0, []).unwrap();
        for _ in 0..=MAX_DEPTH {
            tlv = Tlv::constructed(SEQUENCE, [tlv]).unwrap();
        }
        let bytes = tlv.to_bytes().unwrap();
        assert!(matches!(
            Tlv::from_bytes(&bytes).unwrap_err().root(),
            Error::TooDeep(MAX_DEPTH)
        ));
        assert!(matches!(
            Tlv::from_bytes(&hex!("3080 0000")).unwrap_err().root(),
            Error::UnsupportedLength(0x80)
        ));
    }

    #[test]
    fn test_first_and_select() {
        let notification = Class::ContextSpecific.constructed(47);
        let tlv = Tlv::builder(Class::ContextSpecific.constructed(55))
            .child(
                Tlv::builder(Class::ContextSpecific.constructed(39))
                    .primitive(CTX0, hex!("01"))
                    .child(Tlv::constructed(notification, [Tlv::primitive(CTX0, hex!("02")).unwrap()]).unwrap())
                    .build()
                    .unwrap(),
            )
            .primitive(CTX0, hex!("03"))
            .build()
            .unwrap();

        assert_eq!(tlv.first(CTX0).unwrap().value(), &hex!("01"));
        assert_eq!(tlv.child(CTX0).unwrap().value(), &hex!("03"));
        let path = [Class::ContextSpecific.constructed(39), notification, CTX0];
        assert_eq!(tlv.select(&path).unwrap().value(), &hex!("02"));
        assert!(tlv.select(&[notification]).is_none());
        assert!(tlv.first(CTX1).is_none());
        assert_eq!(tlv.select(&[]), Some(&tlv));
    }

    #[test]
    fn test_header() {
        let tlv = Tlv::constructed(
            Class::ContextSpecific.constructed(1),
            [
                Tlv::primitive(Class::ContextSpecific.primitive(8), vec![0; 200]).unwrap(),
                Tlv::primitive(Class::ContextSpecific.primitive(8), vec![0; 10]).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(tlv.header().unwrap(), hex!("A181D7"));
    }

    #[test]
    fn test_clone_is_independent() {
        let bytes = hex!("3003800101").to_vec();
        let parsed = Tlv::from_bytes(&bytes).unwrap();
        let cloned = parsed.clone();
        drop(parsed);
        drop(bytes);
        assert_eq!(cloned.first(CTX0).unwrap().value(), &hex!("01"));
    }

    #[test]
    fn test_base64_and_serde() {
        let tlv = Tlv::constructed(SEQUENCE, [Tlv::primitive(CTX0, hex!("01")).unwrap()]).unwrap();
        assert_eq!(tlv.to_base64().unwrap(), "MAOAAQE=");
        assert_eq!("MAOAAQE=".parse::<Tlv>().unwrap(), tlv);

        let json = serde_json::to_string(&tlv).unwrap();
        assert_eq!(json, "\"MAOAAQE=\"");
        assert_eq!(serde_json::from_str::<Tlv>(&json).unwrap(), tlv);
        assert!(serde_json::from_str::<Tlv>("\"not base64!\"").is_err());
    }

    #[test]
    fn test_typed_values() {
        let tlv = Tlv::encode(CTX1, &-129i64).unwrap();
        assert_eq!(tlv.value(), &hex!("FF7F"));
        assert_eq!(tlv.decode::<i64>().unwrap(), -129);
        assert!(Tlv::constructed(SEQUENCE, []).unwrap().decode::<i64>().is_err());
        let err = Tlv::primitive(CTX1, hex!("0102")).unwrap().decode::<bool>().unwrap_err();
        assert!(matches!(err.root(), Error::InvalidBoolean(2)));
    }

    #[test]
    fn test_trailing_bytes() {
        let (tlv, rest) = Tlv::parse(&hex!("800101 9000")).unwrap();
        assert_eq!(tlv.value(), &hex!("01"));
        assert_eq!(rest, &hex!("9000"));
        assert!(Tlv::from_bytes(&hex!("800101 9000")).is_ok());
    }

    #[test]
    fn test_interop_with_iso7816_tlv() {
        let tlv = Tlv::builder(Class::ContextSpecific.constructed(33))
            .primitive(CTX0, hex!("DEADBEEF"))
            .primitive(Class::Universal.primitive(4), vec![0x11; 300])
            .build()
            .unwrap();
        let bytes = tlv.to_bytes().unwrap();
        let other = iso7816_tlv::ber::Tlv::from_bytes(&bytes).unwrap();
        assert_eq!(other.to_vec(), bytes);
    }
}
