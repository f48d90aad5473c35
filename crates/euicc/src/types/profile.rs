//! Profile metadata as reported by the card and offered by the SM-DP+

use derive_more::Display;
use nexum_bertlv::{BitString, Tag, Tlv};

use super::identifier::{Iccid, IsdpAid};
use super::notification::NotificationEvent;
use crate::constants::tags;
use crate::{Error, Result};

/// Whether a profile is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProfileState {
    /// Installed but not active
    #[display("disabled")]
    Disabled,
    /// The active profile
    #[display("enabled")]
    Enabled,
}

impl ProfileState {
    fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Self::Disabled),
            1 => Some(Self::Enabled),
            _ => None,
        }
    }
}

/// Profile class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum ProfileClass {
    /// Test profile
    #[display("test")]
    Test,
    /// Provisioning profile
    #[display("provisioning")]
    Provisioning,
    /// Operational profile, the default when the card omits the class
    #[default]
    #[display("operational")]
    Operational,
}

impl ProfileClass {
    /// Numeric value used on the card
    pub const fn code(self) -> i8 {
        match self {
            Self::Test => 0,
            Self::Provisioning => 1,
            Self::Operational => 2,
        }
    }

    fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Self::Test),
            1 => Some(Self::Provisioning),
            2 => Some(Self::Operational),
            _ => None,
        }
    }
}

/// Image format of a profile icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IconType {
    /// JPEG image
    #[display("image/jpeg")]
    Jpg,
    /// PNG image
    #[display("image/png")]
    Png,
}

/// Operator owning a profile
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperatorId {
    /// Mobile country and network code, BCD encoded
    pub plmn: Vec<u8>,
    /// Group identifier level 1
    pub gid1: Option<Vec<u8>>,
    /// Group identifier level 2
    pub gid2: Option<Vec<u8>>,
}

impl OperatorId {
    fn from_tlv(tlv: &Tlv) -> Self {
        Self {
            plmn: tlv
                .child(tags::CTX_0)
                .map(|plmn| plmn.value().to_vec())
                .unwrap_or_default(),
            gid1: tlv.child(tags::CTX_1).map(|gid| gid.value().to_vec()),
            gid2: tlv.child(tags::CTX_2).map(|gid| gid.value().to_vec()),
        }
    }

    /// Mobile country code
    pub fn mcc(&self) -> Option<String> {
        let [first, second, ..] = self.plmn[..] else {
            return None;
        };
        Some(digits(&[first & 0x0F, first >> 4, second & 0x0F]))
    }

    /// Mobile network code, two or three digits
    pub fn mnc(&self) -> Option<String> {
        let [_, second, third, ..] = self.plmn[..] else {
            return None;
        };
        let mut mnc = vec![third & 0x0F, third >> 4];
        if second >> 4 != 0x0F {
            mnc.push(second >> 4);
        }
        Some(digits(&mnc))
    }
}

fn digits(nibbles: &[u8]) -> String {
    nibbles
        .iter()
        .map(|n| char::from_digit(u32::from(*n), 16).unwrap_or('?'))
        .collect()
}

/// Where the card sends notifications for one kind of event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfiguration {
    /// Event the address applies to
    pub event: Option<NotificationEvent>,
    /// Notification server address
    pub address: String,
}

impl NotificationConfiguration {
    fn from_tlv(tlv: &Tlv) -> Result<Self> {
        let event = match tlv.child(tags::CTX_0) {
            Some(bits) => bits
                .decode::<BitString>()?
                .flags::<NotificationEvent>()
                .first()
                .copied(),
            None => None,
        };
        let address = match tlv.child(tags::CTX_1) {
            Some(address) => address.decode()?,
            None => String::new(),
        };
        Ok(Self { event, address })
    }
}

/// Metadata of an installed or offered profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInfo {
    /// Profile ICCID
    pub iccid: Iccid,
    /// AID of the ISD-P holding the profile, absent in offered metadata
    pub isdp_aid: Option<IsdpAid>,
    /// Enabled state, absent in offered metadata
    pub state: Option<ProfileState>,
    /// Nickname set by the user
    pub nickname: Option<String>,
    /// Service provider name
    pub service_provider_name: String,
    /// Profile name
    pub profile_name: String,
    /// Icon image format
    pub icon_type: Option<IconType>,
    /// Icon image
    pub icon: Option<Vec<u8>>,
    /// Profile class
    pub class: ProfileClass,
    /// Profile owner
    pub owner: Option<OperatorId>,
    /// Notification addresses per event
    pub notification_configuration: Vec<NotificationConfiguration>,
}

impl ProfileInfo {
    /// Parse a `ProfileInfo` (`E3`) or `StoreMetadataRequest` (`BF25`)
    pub fn from_tlv(tlv: &Tlv) -> Result<Self> {
        let tag = tlv.tag();
        if tag != tags::PROFILE_INFO && tag != tags::STORE_METADATA {
            return Err(Error::UnexpectedTag {
                expected: tags::PROFILE_INFO,
                actual: tag,
            });
        }

        let iccid = tlv
            .child(tags::ICCID)
            .map(|iccid| Iccid::from_bcd(iccid.value()))
            .ok_or(Error::MissingField("iccid"))?;
        let text = |field: Tag| {
            tlv.child(field)
                .map(|value| value.decode::<String>())
                .transpose()
        };

        let state = match tlv.child(tags::PROFILE_STATE) {
            Some(state) => ProfileState::from_code(state.decode()?),
            None => None,
        };
        let class = match tlv.child(tags::PROFILE_CLASS) {
            Some(class) => ProfileClass::from_code(class.decode()?).unwrap_or_default(),
            None => ProfileClass::default(),
        };
        let icon_type = match tlv.child(tags::ICON_TYPE) {
            Some(icon_type) => match icon_type.decode::<i8>()? {
                0 => Some(IconType::Jpg),
                1 => Some(IconType::Png),
                _ => None,
            },
            None => None,
        };
        let notification_configuration = match tlv.child(tags::NOTIFICATION_CONFIGURATION_INFO) {
            Some(info) => info
                .children()
                .iter()
                .map(NotificationConfiguration::from_tlv)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            iccid,
            isdp_aid: tlv
                .child(tags::ISDP_AID)
                .map(|aid| IsdpAid::new(aid.value()))
                .transpose()?,
            state,
            nickname: text(tags::PROFILE_NICKNAME)?,
            service_provider_name: text(tags::SERVICE_PROVIDER_NAME)?.unwrap_or_default(),
            profile_name: text(tags::PROFILE_NAME)?.unwrap_or_default(),
            icon_type,
            icon: tlv.child(tags::ICON).map(|icon| icon.value().to_vec()),
            class,
            owner: tlv.child(tags::PROFILE_OWNER).map(OperatorId::from_tlv),
            notification_configuration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_profile_info() {
        let tlv = Tlv::from_bytes(&hex!(
            "E3 3E"
            "5A 0A 984474560000214251F8"
            "4F 10 A0000005591010FFFFFFFF8900001100"
            "9F70 01 01"
            "90 04 77 6F 72 6B"
            "91 04 41 63 6D 65"
            "92 04 54 65 73 74"
            "95 01 02"
            "B7 05 80 03 13 F0 01"
        ))
        .unwrap();
        let info = ProfileInfo::from_tlv(&tlv).unwrap();
        assert_eq!(info.iccid.to_string(), "8944476500001224158");
        assert_eq!(
            info.isdp_aid.unwrap().to_string(),
            "A0000005591010FFFFFFFF8900001100"
        );
        assert_eq!(info.state, Some(ProfileState::Enabled));
        assert_eq!(info.nickname.as_deref(), Some("work"));
        assert_eq!(info.service_provider_name, "Acme");
        assert_eq!(info.profile_name, "Test");
        assert_eq!(info.class, ProfileClass::Operational);

        let owner = info.owner.unwrap();
        assert_eq!(owner.mcc().as_deref(), Some("310"));
        assert_eq!(owner.mnc().as_deref(), Some("10"));
    }

    #[test]
    fn test_offered_metadata() {
        let tlv = Tlv::from_bytes(&hex!(
            "BF25 23"
            "5A 0A 984474560000214251F8"
            "91 04 41 63 6D 65"
            "92 04 54 65 73 74"
            "B6 09 30 07 80 02 07 80 81 01 78"
        ))
        .unwrap();
        let info = ProfileInfo::from_tlv(&tlv).unwrap();
        assert_eq!(info.state, None);
        assert_eq!(info.isdp_aid, None);
        assert_eq!(
            info.notification_configuration,
            vec![NotificationConfiguration {
                event: Some(NotificationEvent::Install),
                address: "x".into(),
            }]
        );
    }

    #[test]
    fn test_missing_iccid() {
        let tlv = Tlv::from_bytes(&hex!("E3 03 91 01 41")).unwrap();
        assert!(matches!(
            ProfileInfo::from_tlv(&tlv),
            Err(Error::MissingField("iccid"))
        ));
        let tlv = Tlv::from_bytes(&hex!("A0 00")).unwrap();
        assert!(matches!(
            ProfileInfo::from_tlv(&tlv),
            Err(Error::UnexpectedTag { .. })
        ));
    }
}
