//! Scalar value encoders
//!
//! These convert between Rust values and the raw value bytes of a primitive
//! TLV node. Integers use minimal big-endian two's complement, booleans are a
//! single `00`/`FF` byte, and bit strings follow the ASN.1 layout of an
//! unused-bits count followed by the bits packed most significant first.

use crate::{Error, Result};

/// Types that can be encoded as the value of a primitive TLV
pub trait EncodeValue {
    /// Encode `self` into raw value bytes
    fn encode_value(&self) -> Vec<u8>;
}

/// Types that can be decoded from the value of a primitive TLV
pub trait DecodeValue: Sized {
    /// Decode raw value bytes
    fn decode_value(value: &[u8]) -> Result<Self>;
}

/// Strip redundant sign bytes from a big-endian two's complement integer
fn trim_signed(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let (head, next) = (bytes[start], bytes[start + 1]);
        let redundant =
            (head == 0x00 && next & 0x80 == 0) || (head == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}

macro_rules! impl_signed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EncodeValue for $ty {
                fn encode_value(&self) -> Vec<u8> {
                    trim_signed(&self.to_be_bytes()).to_vec()
                }
            }

            impl DecodeValue for $ty {
                fn decode_value(value: &[u8]) -> Result<Self> {
                    const WIDTH: usize = size_of::<$ty>();
                    if value.len() > WIDTH {
                        return Err(Error::IntegerOverflow {
                            width: WIDTH,
                            actual: value.len(),
                        });
                    }
                    let Some(first) = value.first() else {
                        return Ok(0);
                    };
                    let fill = if first & 0x80 != 0 { 0xFF } else { 0x00 };
                    let mut bytes = [fill; WIDTH];
                    bytes[WIDTH - value.len()..].copy_from_slice(value);
                    Ok(<$ty>::from_be_bytes(bytes))
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64);

impl EncodeValue for bool {
    fn encode_value(&self) -> Vec<u8> {
        vec![if *self { 0xFF } else { 0x00 }]
    }
}

impl DecodeValue for bool {
    fn decode_value(value: &[u8]) -> Result<Self> {
        match value {
            [byte] => Ok(*byte != 0x00),
            other => Err(Error::InvalidBoolean(other.len())),
        }
    }
}

impl EncodeValue for String {
    fn encode_value(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl DecodeValue for String {
    fn decode_value(value: &[u8]) -> Result<Self> {
        Ok(Self::from_utf8(value.to_vec())?)
    }
}

/// An absent value encodes as an empty value
impl<T: EncodeValue> EncodeValue for Option<T> {
    fn encode_value(&self) -> Vec<u8> {
        self.as_ref().map(T::encode_value).unwrap_or_default()
    }
}

/// An empty value decodes as `None`
impl<T: DecodeValue> DecodeValue for Option<T> {
    fn decode_value(value: &[u8]) -> Result<Self> {
        if value.is_empty() {
            return Ok(None);
        }
        T::decode_value(value).map(Some)
    }
}

/// An enumerated flag occupying a fixed bit position in a [`BitString`]
pub trait BitFlag: Copy + Sized {
    /// Total number of named bits in the flag set
    const WIDTH: usize;

    /// Bit position of this flag, zero being the most significant bit
    fn bit(self) -> usize;

    /// Flag at the given bit position
    fn from_bit(bit: usize) -> Option<Self>;
}

/// An ASN.1 bit string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitString {
    bits: Vec<bool>,
}

impl BitString {
    /// A bit string of `len` cleared bits
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// A bit string from individual bits
    pub const fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// A bit string sized for `F` with exactly the given flags set
    pub fn from_flags<F: BitFlag>(flags: impl IntoIterator<Item = F>) -> Self {
        let mut bits = Self::new(F::WIDTH);
        for flag in flags {
            bits.set(flag.bit(), true);
        }
        bits
    }

    /// Flags of type `F` whose bits are set, in bit order
    ///
    /// Set bits with no corresponding flag are ignored.
    pub fn flags<F: BitFlag>(&self) -> Vec<F> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .filter_map(|(bit, _)| F::from_bit(bit))
            .collect()
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the bit string has no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Value of a bit, `false` if out of range
    pub fn get(&self, bit: usize) -> bool {
        self.bits.get(bit).copied().unwrap_or(false)
    }

    /// Set a bit, growing the bit string if needed
    pub fn set(&mut self, bit: usize, value: bool) {
        if bit >= self.bits.len() {
            self.bits.resize(bit + 1, false);
        }
        self.bits[bit] = value;
    }

    /// All bits
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

impl EncodeValue for BitString {
    fn encode_value(&self) -> Vec<u8> {
        let octets = self.bits.len().div_ceil(8);
        let mut out = vec![0u8; 1 + octets];
        out[0] = (octets * 8 - self.bits.len()) as u8;
        for (index, _) in self.bits.iter().enumerate().filter(|(_, set)| **set) {
            out[1 + index / 8] |= 0x80 >> (index % 8);
        }
        out
    }
}

impl DecodeValue for BitString {
    fn decode_value(value: &[u8]) -> Result<Self> {
        let Some((&unused, octets)) = value.split_first() else {
            return Err(Error::InvalidBitString("missing unused-bits count"));
        };
        if unused > 7 || (octets.is_empty() && unused != 0) {
            return Err(Error::InvalidBitString("invalid unused-bits count"));
        }
        let len = octets.len() * 8 - unused as usize;
        let bits = (0..len)
            .map(|index| octets[index / 8] & (0x80 >> (index % 8)) != 0)
            .collect();
        Ok(Self { bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_minimal_integer_encoding() {
        let cases: [(i64, &[u8]); 8] = [
            (0, &hex!("00")),
            (-1, &hex!("FF")),
            (127, &hex!("7F")),
            (-128, &hex!("80")),
            (128, &hex!("0080")),
            (-129, &hex!("FF7F")),
            (32767, &hex!("7FFF")),
            (-32768, &hex!("8000")),
        ];
        for (value, expected) in cases {
            let encoded = value.encode_value();
            assert_eq!(encoded, expected, "encoding {value}");
            assert_eq!(i64::decode_value(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(i8::MIN.encode_value(), hex!("80"));
        assert_eq!(i32::MAX.encode_value(), hex!("7FFFFFFF"));
        assert_eq!(i64::MIN.encode_value(), hex!("8000000000000000"));
        assert_eq!(i16::decode_value(&hex!("FF7F")).unwrap(), -129);
        assert_eq!(i32::decode_value(&hex!("0080")).unwrap(), 128);
    }

    #[test]
    fn test_integer_decode_edges() {
        assert_eq!(i32::decode_value(&[]).unwrap(), 0);
        assert!(matches!(
            i8::decode_value(&hex!("0080")),
            Err(Error::IntegerOverflow { width: 1, actual: 2 })
        ));
        assert!(i64::decode_value(&hex!("000000000000000001")).is_err());
    }

    #[test]
    fn test_boolean() {
        assert_eq!(true.encode_value(), hex!("FF"));
        assert_eq!(false.encode_value(), hex!("00"));
        assert!(bool::decode_value(&hex!("01")).unwrap());
        assert!(!bool::decode_value(&hex!("00")).unwrap());
        assert!(matches!(bool::decode_value(&[]), Err(Error::InvalidBoolean(0))));
    }

    #[test]
    fn test_optional_values() {
        assert!(None::<i64>.encode_value().is_empty());
        assert_eq!(Some(5i64).encode_value(), hex!("05"));
        assert_eq!(Option::<i64>::decode_value(&[]).unwrap(), None);
        assert_eq!(Option::<i64>::decode_value(&hex!("05")).unwrap(), Some(5));
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Install,
        Enable,
        Disable,
        Delete,
    }

    impl BitFlag for Event {
        const WIDTH: usize = 4;

        fn bit(self) -> usize {
            self as usize
        }

        fn from_bit(bit: usize) -> Option<Self> {
            [Self::Install, Self::Enable, Self::Disable, Self::Delete]
                .get(bit)
                .copied()
        }
    }

    #[test]
    fn test_bit_string_flags() {
        let bits = BitString::from_flags([Event::Install, Event::Delete]);
        assert_eq!(bits.encode_value(), hex!("0490"));

        let bits = BitString::from_flags([Event::Enable]);
        assert_eq!(bits.encode_value(), hex!("0440"));

        let decoded = BitString::decode_value(&hex!("04B0")).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(
            decoded.flags::<Event>(),
            vec![Event::Install, Event::Disable, Event::Delete]
        );

        assert_eq!(BitString::from_flags::<Event>([]).encode_value(), hex!("0400"));
    }

    #[test]
    fn test_bit_string_layout() {
        assert_eq!(BitString::default().encode_value(), hex!("00"));
        let bits = BitString::from_bits(vec![true; 9]);
        assert_eq!(bits.encode_value(), hex!("07FF80"));

        let decoded = BitString::decode_value(&hex!("07FF80")).unwrap();
        assert_eq!(decoded, bits);
        assert!(decoded.get(8));
        assert!(!decoded.get(9));
    }

    #[test]
    fn test_bit_string_invalid() {
        assert!(BitString::decode_value(&[]).is_err());
        assert!(BitString::decode_value(&hex!("08FF")).is_err());
        assert!(BitString::decode_value(&hex!("03")).is_err());
    }
}
