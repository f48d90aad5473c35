//! Card and profile identifiers
//!
//! ICCIDs and IMEIs travel in GSM-BCD: two digits per byte with the nibbles
//! swapped, and an odd digit count padded with `F`.

use std::fmt;
use std::str::FromStr;

use nexum_bertlv::Tlv;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::constants::tags;
use crate::{Error, Result};

/// Encode a digit string as GSM-BCD
///
/// `F` is accepted as a filler digit in either case.
pub fn encode_bcd(digits: &str) -> Result<Vec<u8>> {
    let nibbles = digits
        .bytes()
        .map(|digit| match digit {
            b'0'..=b'9' => Some(digit - b'0'),
            b'f' | b'F' => Some(0x0F),
            _ => None,
        })
        .collect::<Option<Vec<u8>>>()
        .ok_or(Error::invalid_identifier("BCD string", "non-digit character"))?;

    Ok(nibbles
        .chunks(2)
        .map(|pair| {
            let high = pair.get(1).copied().unwrap_or(0x0F);
            (high << 4) | pair[0]
        })
        .collect())
}

/// Decode GSM-BCD bytes, stopping at the first filler nibble
pub fn decode_bcd(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|byte| [byte & 0x0F, byte >> 4])
        .take_while(|nibble| *nibble != 0x0F)
        .map(|nibble| char::from_digit(u32::from(nibble), 16).unwrap_or('?'))
        .collect()
}

fn check_digits(
    kind: &'static str,
    digits: &str,
    range: std::ops::RangeInclusive<usize>,
) -> Result<()> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_identifier(kind, "must contain only digits"));
    }
    if !range.contains(&digits.len()) {
        return Err(Error::invalid_identifier(kind, "wrong number of digits"));
    }
    Ok(())
}

/// Integrated Circuit Card Identifier of a profile
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Iccid(Vec<u8>);

impl Iccid {
    /// Parse an ICCID of 19 or 20 digits
    pub fn new(digits: &str) -> Result<Self> {
        check_digits("ICCID", digits, 19..=20)?;
        encode_bcd(digits).map(Self)
    }

    /// ICCID from its BCD encoding as found on the card
    pub fn from_bcd(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// BCD encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Iccid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Iccid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&decode_bcd(&self.0))
    }
}

impl fmt::Debug for Iccid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iccid({self})")
    }
}

/// International Mobile Equipment Identity of the device
#[derive(Clone, PartialEq, Eq)]
pub struct Imei(Vec<u8>);

impl Imei {
    /// Parse an IMEI (15 digits) or IMEISV (16 digits)
    pub fn new(digits: &str) -> Result<Self> {
        check_digits("IMEI", digits, 15..=16)?;
        encode_bcd(digits).map(Self)
    }

    /// BCD encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Type Allocation Code, the first eight digits
    pub fn tac(&self) -> &[u8] {
        &self.0[..4]
    }
}

impl FromStr for Imei {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Imei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&decode_bcd(&self.0))
    }
}

impl fmt::Debug for Imei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imei({self})")
    }
}

/// Application identifier of the ISD-P holding a profile
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IsdpAid(Vec<u8>);

impl IsdpAid {
    /// AID from raw bytes (5 to 16 bytes)
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if !(5..=16).contains(&bytes.len()) {
            return Err(Error::invalid_identifier("ISD-P AID", "must be 5 to 16 bytes"));
        }
        Ok(Self(bytes))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for IsdpAid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s).map_err(|_| Error::invalid_identifier("ISD-P AID", "not hex"))?;
        Self::new(bytes)
    }
}

impl fmt::Display for IsdpAid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl fmt::Debug for IsdpAid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IsdpAid({self})")
    }
}

/// eUICC identifier
#[derive(Clone, PartialEq, Eq)]
pub struct Eid(Vec<u8>);

impl Eid {
    pub(crate) const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl fmt::Debug for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Eid({self})")
    }
}

/// RSP session identifier assigned by the SM-DP+
///
/// Serialized in JSON as an uppercase hex string.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct TransactionId(Vec<u8>);

impl TransactionId {
    /// Transaction ID from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({self})")
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map(Self).map_err(de::Error::custom)
    }
}

/// A profile selected either by ICCID or by ISD-P AID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// Select by ICCID (`5A`)
    Iccid(Iccid),
    /// Select by ISD-P AID (`4F`)
    IsdpAid(IsdpAid),
}

impl Identifier {
    /// TLV carrying the identifier in card requests
    pub fn to_tlv(&self) -> Result<Tlv> {
        let tlv = match self {
            Self::Iccid(iccid) => Tlv::primitive(tags::ICCID, iccid.as_bytes())?,
            Self::IsdpAid(aid) => Tlv::primitive(tags::ISDP_AID, aid.as_bytes())?,
        };
        Ok(tlv)
    }
}

impl From<Iccid> for Identifier {
    fn from(iccid: Iccid) -> Self {
        Self::Iccid(iccid)
    }
}

impl From<IsdpAid> for Identifier {
    fn from(aid: IsdpAid) -> Self {
        Self::IsdpAid(aid)
    }
}

impl FromStr for Identifier {
    type Err = Error;

    /// Digit strings are ICCIDs, anything else is read as a hex AID
    fn from_str(s: &str) -> Result<Self> {
        if s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().map(Self::Iccid)
        } else {
            s.parse().map(Self::IsdpAid)
        }
    }
}
