//! Profile management notifications queued on the card

use derive_more::Display;
use nexum_bertlv::{BitFlag, BitString, Tlv};

use super::identifier::Iccid;
use crate::constants::tags;
use crate::{Error, Result};

/// Profile management operation that produced a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NotificationEvent {
    /// Profile installed
    #[display("install")]
    Install,
    /// Profile enabled
    #[display("enable")]
    Enable,
    /// Profile disabled
    #[display("disable")]
    Disable,
    /// Profile deleted
    #[display("delete")]
    Delete,
}

impl BitFlag for NotificationEvent {
    const WIDTH: usize = 4;

    fn bit(self) -> usize {
        self as usize
    }

    fn from_bit(bit: usize) -> Option<Self> {
        match bit {
            0 => Some(Self::Install),
            1 => Some(Self::Enable),
            2 => Some(Self::Disable),
            3 => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Header of a pending notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMetadata {
    /// Sequence number assigned by the card
    pub sequence_number: i64,
    /// Operation that produced the notification
    pub event: Option<NotificationEvent>,
    /// Address of the server to notify
    pub address: String,
    /// ICCID of the profile concerned
    pub iccid: Option<Iccid>,
}

impl NotificationMetadata {
    /// Parse `NotificationMetadata` (`BF2F`)
    pub fn from_tlv(tlv: &Tlv) -> Result<Self> {
        Error::check_tag(tags::NOTIFICATION_METADATA, tlv.tag())?;
        let sequence_number = tlv
            .child(tags::CTX_0)
            .ok_or(Error::MissingField("seqNumber"))?
            .decode()?;
        let event = match tlv.child(tags::CTX_1) {
            Some(bits) => bits
                .decode::<BitString>()?
                .flags::<NotificationEvent>()
                .first()
                .copied(),
            None => None,
        };
        let address = match tlv.child(tags::UTF8_STRING) {
            Some(address) => address.decode()?,
            None => String::new(),
        };
        Ok(Self {
            sequence_number,
            event,
            address,
            iccid: tlv
                .child(tags::ICCID)
                .map(|iccid| Iccid::from_bcd(iccid.value())),
        })
    }
}

/// A signed notification waiting to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    /// The signed notification as sent to the server
    pub notification: Tlv,
    /// Its metadata
    pub metadata: NotificationMetadata,
}

impl PendingNotification {
    /// Parse a `ProfileInstallationResult` (`BF37`) or `OtherSignedNotification` (`30`)
    pub fn from_tlv(tlv: Tlv) -> Result<Self> {
        let metadata = if tlv.tag() == tags::PROFILE_INSTALLATION_RESULT {
            tlv.select(&[
                tags::PROFILE_INSTALLATION_RESULT_DATA,
                tags::NOTIFICATION_METADATA,
            ])
        } else {
            Error::check_tag(tags::SEQUENCE, tlv.tag())?;
            tlv.child(tags::NOTIFICATION_METADATA)
        }
        .ok_or(Error::MissingField("notificationMetadata"))?;

        Ok(Self {
            metadata: NotificationMetadata::from_tlv(metadata)?,
            notification: tlv,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const METADATA: [u8; 20] = hex!(
        "BF2F 11"
        "80 01 05"
        "81 02 04 20"
        "0C 05 73 6D 64 70 2E"
        "5A 01 98"
    );

    #[test]
    fn test_metadata() {
        let metadata = NotificationMetadata::from_tlv(&Tlv::from_bytes(&METADATA).unwrap()).unwrap();
        assert_eq!(metadata.sequence_number, 5);
        assert_eq!(metadata.event, Some(NotificationEvent::Disable));
        assert_eq!(metadata.address, "smdp.");
        assert_eq!(metadata.iccid.unwrap().to_string(), "89");
    }

    #[test]
    fn test_event_bits() {
        let bits = BitString::from_flags([NotificationEvent::Enable, NotificationEvent::Delete]);
        assert_eq!(nexum_bertlv::EncodeValue::encode_value(&bits), hex!("04 50"));
        assert_eq!(
            bits.flags::<NotificationEvent>(),
            vec![NotificationEvent::Enable, NotificationEvent::Delete]
        );
    }

    #[test]
    fn test_pending_notification() {
        let other = Tlv::constructed(tags::SEQUENCE, [Tlv::from_bytes(&METADATA).unwrap()]).unwrap();
        let pending = PendingNotification::from_tlv(other.clone()).unwrap();
        assert_eq!(pending.notification, other);
        assert_eq!(pending.metadata.sequence_number, 5);

        let installed = Tlv::builder(tags::PROFILE_INSTALLATION_RESULT)
            .child_result(
                Tlv::builder(tags::PROFILE_INSTALLATION_RESULT_DATA)
                    .primitive(tags::CTX_0, [0x01u8])
                    .child(Tlv::from_bytes(&METADATA).unwrap())
                    .build(),
            )
            .build()
            .unwrap();
        let pending = PendingNotification::from_tlv(installed).unwrap();
        assert_eq!(pending.metadata.event, Some(NotificationEvent::Disable));

        let missing = Tlv::constructed(tags::SEQUENCE, []).unwrap();
        assert!(matches!(
            PendingNotification::from_tlv(missing),
            Err(Error::MissingField("notificationMetadata"))
        ));
    }
}
