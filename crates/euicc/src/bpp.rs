//! Bound profile package segmentation and loading
//!
//! The card's secure loading procedure consumes one command-chaining unit at
//! a time. The package is therefore sent as a fixed sequence of segments:
//!
//! 1. the `BF36` header followed by the whole `InitialiseSecureChannel`
//! 2. the first sequence of `87`
//! 3. the `A1` header, then each `88` on its own
//! 4. the second sequence of `87`, when present
//! 5. the `A3` header, then each `86` on its own
//!
//! Every segment is one [`Transmitter::transmit_raw`] call, which the logical
//! channel splits further into STORE DATA blocks.

use nexum_bertlv::{Tag, Tlv};
use tracing::{debug, trace};

use crate::constants::tags;
use crate::es10b::ProfileInstallationResult;
use crate::transmitter::Transmitter;
use crate::{Error, Result};

const REQUIRED: [(Tag, &str); 4] = [
    (tags::INITIALISE_SECURE_CHANNEL, "initialiseSecureChannelRequest"),
    (tags::FIRST_SEQUENCE_OF_87, "firstSequenceOf87"),
    (tags::SEQUENCE_OF_88, "sequenceOf88"),
    (tags::SEQUENCE_OF_86, "sequenceOf86"),
];

/// Check the package tag and that every required element is present
///
/// All missing elements are reported together.
pub fn validate(bpp: &Tlv) -> Result<()> {
    Error::check_tag(tags::BOUND_PROFILE_PACKAGE, bpp.tag())?;
    let missing: Vec<&'static str> = REQUIRED
        .iter()
        .filter(|(tag, _)| bpp.child(*tag).is_none())
        .map(|(_, name)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidBoundProfilePackage(missing))
    }
}

fn required(bpp: &Tlv, index: usize) -> Result<&Tlv> {
    let (tag, name) = REQUIRED[index];
    bpp.child(tag).ok_or(Error::MissingField(name))
}

/// Split a bound profile package into the segments the card expects
pub fn segment(bpp: &Tlv) -> Result<Vec<Vec<u8>>> {
    validate(bpp)?;
    let mut segments = Vec::new();

    let mut first = bpp.header()?;
    first.extend(required(bpp, 0)?.to_bytes()?);
    segments.push(first);

    segments.push(required(bpp, 1)?.to_bytes()?);

    let sequence_of_88 = required(bpp, 2)?;
    segments.push(sequence_of_88.header()?);
    for element in sequence_of_88.children() {
        segments.push(element.to_bytes()?);
    }

    if let Some(second) = bpp.child(tags::SECOND_SEQUENCE_OF_87) {
        segments.push(second.to_bytes()?);
    }

    let sequence_of_86 = required(bpp, 3)?;
    segments.push(sequence_of_86.header()?);
    for element in sequence_of_86.children() {
        segments.push(element.to_bytes()?);
    }

    Ok(segments)
}

/// Load a bound profile package onto the card
///
/// Segments are sent in order until the card answers with data, which is
/// the `ProfileInstallationResult`. The card answers early when it rejects
/// the package, so the remaining segments are not sent.
pub fn load<T: Transmitter>(transmitter: &T, bpp: &Tlv) -> Result<ProfileInstallationResult> {
    let segments = segment(bpp)?;
    debug!(segments = segments.len(), "Loading bound profile package");

    for (index, segment) in segments.iter().enumerate() {
        trace!(segment = index, len = segment.len(), "Sending BPP segment");
        let response = transmitter.transmit_raw(segment)?;
        if !response.is_empty() {
            return ProfileInstallationResult::from_tlv(Tlv::from_bytes(&response)?);
        }
    }
    Err(Error::MissingField("profileInstallationResult"))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use hex_literal::hex;

    const BPP: [u8; 39] = hex!(
        "BF36 24"
        "BF23 03 80 01 01"
        "A0 04 87 02 AABB"
        "A1 0C 88 02 0101 88 02 0202 88 02 0303"
        "A3 08 86 02 1111 86 02 2222"
    );

    const RESULT: [u8; 33] = hex!(
        "BF37 1E"
        "BF27 1B"
        "80 02 0102"
        "BF2F 09 80 01 01 81 02 04 80 0C 00"
        "A2 09 A0 07 4F 05 A000000559"
    );

    struct Card {
        sent: RefCell<Vec<Vec<u8>>>,
        answer_at: usize,
        answer: Vec<u8>,
    }

    impl Transmitter for Card {
        fn transmit_raw(&self, command: &[u8]) -> Result<Vec<u8>> {
            let mut sent = self.sent.borrow_mut();
            sent.push(command.to_vec());
            if sent.len() == self.answer_at {
                Ok(self.answer.clone())
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn test_segment_order() {
        let bpp = Tlv::from_bytes(&BPP).unwrap();
        let segments = segment(&bpp).unwrap();
        let expected: [&[u8]; 9] = [
            &hex!("BF36 24 BF23 03 80 01 01"),
            &hex!("A0 04 87 02 AABB"),
            &hex!("A1 0C"),
            &hex!("88 02 0101"),
            &hex!("88 02 0202"),
            &hex!("88 02 0303"),
            &hex!("A3 08"),
            &hex!("86 02 1111"),
            &hex!("86 02 2222"),
        ];
        assert_eq!(segments, expected.map(<[u8]>::to_vec));
    }

    #[test]
    fn test_segment_second_sequence_of_87() {
        let bpp = Tlv::from_bytes(&BPP).unwrap();
        let mut children = bpp.children().to_vec();
        children.insert(3, Tlv::from_bytes(&hex!("A2 04 87 02 CCDD")).unwrap());
        let bpp = Tlv::constructed(tags::BOUND_PROFILE_PACKAGE, children).unwrap();

        let segments = segment(&bpp).unwrap();
        assert_eq!(segments.len(), 10);
        assert_eq!(segments[6], hex!("A2 04 87 02 CCDD"));
        assert_eq!(segments[7], hex!("A3 08"));
    }

    #[test]
    fn test_validate_reports_all_missing() {
        let bpp = Tlv::from_bytes(&hex!("BF36 0C BF23 03 80 01 01 A0 04 87 02 AABB")).unwrap();
        let err = validate(&bpp).unwrap_err();
        assert!(matches!(
            &err,
            Error::InvalidBoundProfilePackage(missing)
                if missing == &["sequenceOf88", "sequenceOf86"]
        ));
        assert_eq!(
            err.to_string(),
            "invalid bound profile package: missing sequenceOf88, missing sequenceOf86"
        );

        let other = Tlv::from_bytes(&hex!("BF37 00")).unwrap();
        assert!(matches!(validate(&other), Err(Error::UnexpectedTag { .. })));
    }

    #[test]
    fn test_load_stops_at_result() {
        let card = Card {
            sent: RefCell::default(),
            answer_at: 4,
            answer: hex!("BF37 03 BF27 00").to_vec(),
        };
        let bpp = Tlv::from_bytes(&BPP).unwrap();
        assert!(matches!(
            load(&card, &bpp),
            Err(Error::MissingField("finalResult"))
        ));
        assert_eq!(card.sent.borrow().len(), 4);
    }

    #[test]
    fn test_load_installs() {
        let card = Card {
            sent: RefCell::default(),
            answer_at: 9,
            answer: RESULT.to_vec(),
        };
        let bpp = Tlv::from_bytes(&BPP).unwrap();
        let result = load(&card, &bpp).unwrap();
        assert_eq!(result.notification.sequence_number, 1);
        assert_eq!(card.sent.borrow().len(), 9);

        let silent = Card {
            sent: RefCell::default(),
            answer_at: 0,
            answer: Vec::new(),
        };
        assert!(matches!(
            load(&silent, &bpp),
            Err(Error::MissingField("profileInstallationResult"))
        ));
    }
}
