//! ES10c: local profile management functions

use derive_more::Display;
use nexum_bertlv::{BitFlag, BitString, Tag, Tlv};

use crate::constants::tags;
use crate::es10b::result_code;
use crate::transmitter::CardRequest;
use crate::types::{Eid, Iccid, Identifier, IsdpAid, ProfileClass, ProfileInfo};
use crate::{Error, Result};

/// Longest nickname the card stores, in bytes
pub const MAX_NICKNAME_LEN: usize = 64;

/// Restricts [`GetProfilesInfo`] to matching profiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSearch {
    /// Profile with this ICCID
    Iccid(Iccid),
    /// Profile in this ISD-P
    IsdpAid(IsdpAid),
    /// All profiles of a class
    Class(ProfileClass),
}

impl From<Identifier> for ProfileSearch {
    fn from(identifier: Identifier) -> Self {
        match identifier {
            Identifier::Iccid(iccid) => Self::Iccid(iccid),
            Identifier::IsdpAid(aid) => Self::IsdpAid(aid),
        }
    }
}

impl ProfileSearch {
    fn to_tlv(&self) -> Result<Tlv> {
        let criterion = match self {
            Self::Iccid(iccid) => Tlv::primitive(tags::ICCID, iccid.as_bytes())?,
            Self::IsdpAid(aid) => Tlv::primitive(tags::ISDP_AID, aid.as_bytes())?,
            Self::Class(class) => Tlv::encode(tags::PROFILE_CLASS, &class.code())?,
        };
        Ok(Tlv::constructed(tags::CTX_CONSTRUCTED_0, [criterion])?)
    }
}

/// `ProfileInfoListRequest` (`BF2D`)
#[derive(Debug, Clone, Default)]
pub struct GetProfilesInfo {
    /// Only return matching profiles
    pub search: Option<ProfileSearch>,
    /// Only return these fields, or the card's default set when empty
    pub tags: Vec<Tag>,
}

impl CardRequest for GetProfilesInfo {
    type Response = Vec<ProfileInfo>;

    fn to_tlv(&self) -> Result<Tlv> {
        let search = self.search.as_ref().map(ProfileSearch::to_tlv).transpose()?;
        let tag_list = (!self.tags.is_empty())
            .then(|| {
                let list: Vec<u8> = self
                    .tags
                    .iter()
                    .flat_map(|tag| tag.as_bytes().to_vec())
                    .collect();
                Tlv::primitive(tags::TAG_LIST, list)
            })
            .transpose()?;
        Ok(Tlv::builder(tags::PROFILE_INFO_LIST)
            .child_opt(search)
            .child_opt(tag_list)
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Self::Response> {
        Error::check_tag(tags::PROFILE_INFO_LIST, response.tag())?;
        if let Some(code) = response.child(tags::CTX_1) {
            let code = code.decode()?;
            return Err(Error::Card {
                function: "getProfilesInfo",
                reason: match code {
                    1 => "incorrectInputValues",
                    _ => "undefinedError",
                },
                code,
            });
        }
        response
            .child(tags::CTX_CONSTRUCTED_0)
            .map(Tlv::children)
            .unwrap_or_default()
            .iter()
            .map(ProfileInfo::from_tlv)
            .collect()
    }
}

/// Profile state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOperation {
    /// `EnableProfile` (`BF31`)
    Enable,
    /// `DisableProfile` (`BF32`)
    Disable,
    /// `DeleteProfile` (`BF33`)
    Delete,
}

impl ProfileOperation {
    const fn tag(self) -> Tag {
        match self {
            Self::Enable => tags::ENABLE_PROFILE,
            Self::Disable => tags::DISABLE_PROFILE,
            Self::Delete => tags::DELETE_PROFILE,
        }
    }

    /// Card function name
    pub const fn function(self) -> &'static str {
        match self {
            Self::Enable => "enableProfile",
            Self::Disable => "disableProfile",
            Self::Delete => "deleteProfile",
        }
    }

    const fn reason(self, code: i64) -> &'static str {
        match (self, code) {
            (_, 1) => "iccidOrAidNotFound",
            (Self::Enable | Self::Delete, 2) => "profileNotInDisabledState",
            (_, 2) => "profileNotInEnabledState",
            (_, 3) => "disallowedByPolicy",
            (Self::Enable, 4) => "wrongProfileReenabling",
            (_, 5) => "catBusy",
            _ => "undefinedError",
        }
    }
}

/// Enable, disable or delete one profile
#[derive(Debug, Clone)]
pub struct ProfileRequest {
    /// Operation to perform
    pub operation: ProfileOperation,
    /// Target profile
    pub identifier: Identifier,
    /// Ask the device to refresh after the change, ignored for delete
    pub refresh: bool,
}

impl CardRequest for ProfileRequest {
    type Response = ();

    fn to_tlv(&self) -> Result<Tlv> {
        let builder = Tlv::builder(self.operation.tag());
        let builder = match self.operation {
            ProfileOperation::Delete => builder.child(self.identifier.to_tlv()?),
            ProfileOperation::Enable | ProfileOperation::Disable => builder
                .child_result(Tlv::constructed(
                    tags::CTX_CONSTRUCTED_0,
                    [self.identifier.to_tlv()?],
                ))
                .encode(tags::CTX_1, &self.refresh),
        };
        Ok(builder.build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<()> {
        Error::check_tag(self.operation.tag(), response.tag())?;
        match result_code(&response)? {
            0 => Ok(()),
            code => Err(Error::Card {
                function: self.operation.function(),
                reason: self.operation.reason(code),
                code,
            }),
        }
    }
}

/// What `EuiccMemoryReset` removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ResetOption {
    /// Operational profiles
    #[display("deleteOperationalProfiles")]
    DeleteOperationalProfiles,
    /// Test profiles loaded in the field
    #[display("deleteFieldLoadedTestProfiles")]
    DeleteFieldLoadedTestProfiles,
    /// Default SM-DP+ address
    #[display("resetDefaultSmdpAddress")]
    ResetDefaultSmdpAddress,
}

impl BitFlag for ResetOption {
    const WIDTH: usize = 3;

    fn bit(self) -> usize {
        self as usize
    }

    fn from_bit(bit: usize) -> Option<Self> {
        match bit {
            0 => Some(Self::DeleteOperationalProfiles),
            1 => Some(Self::DeleteFieldLoadedTestProfiles),
            2 => Some(Self::ResetDefaultSmdpAddress),
            _ => None,
        }
    }
}

/// `EuiccMemoryReset` (`BF34`)
#[derive(Debug, Clone, Default)]
pub struct EuiccMemoryReset {
    /// Content to remove
    pub options: Vec<ResetOption>,
}

impl CardRequest for EuiccMemoryReset {
    type Response = ();

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::builder(tags::EUICC_MEMORY_RESET)
            .encode(tags::CTX_2, &BitString::from_flags(self.options.iter().copied()))
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<()> {
        Error::check_tag(tags::EUICC_MEMORY_RESET, response.tag())?;
        match result_code(&response)? {
            0 => Ok(()),
            code => Err(Error::Card {
                function: "euiccMemoryReset",
                reason: match code {
                    1 => "nothingToDelete",
                    5 => "catBusy",
                    _ => "undefinedError",
                },
                code,
            }),
        }
    }
}

/// `GetEuiccData` (`BF3E`) asking for the EID
#[derive(Debug, Clone, Copy, Default)]
pub struct GetEid;

impl CardRequest for GetEid {
    type Response = Eid;

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::builder(tags::GET_EUICC_DATA)
            .primitive(tags::TAG_LIST, tags::ICCID.as_bytes())
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Eid> {
        Error::check_tag(tags::GET_EUICC_DATA, response.tag())?;
        response
            .child(tags::ICCID)
            .map(|eid| Eid::new(eid.value().to_vec()))
            .ok_or(Error::MissingField("eidValue"))
    }
}

/// `SetNickname` (`BF29`)
#[derive(Debug, Clone)]
pub struct SetNickname {
    /// Profile to rename
    pub iccid: Iccid,
    /// New nickname, empty to clear it
    pub nickname: String,
}

impl SetNickname {
    /// Build the request, rejecting nicknames the card cannot store
    pub fn new(iccid: Iccid, nickname: impl Into<String>) -> Result<Self> {
        let nickname = nickname.into();
        if nickname.len() > MAX_NICKNAME_LEN {
            return Err(Error::InvalidNickname("longer than 64 bytes"));
        }
        if nickname.chars().any(char::is_control) {
            return Err(Error::InvalidNickname("contains control characters"));
        }
        Ok(Self { iccid, nickname })
    }
}

impl CardRequest for SetNickname {
    type Response = ();

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::builder(tags::SET_NICKNAME)
            .primitive(tags::ICCID, self.iccid.as_bytes())
            .encode(tags::PROFILE_NICKNAME, &self.nickname)
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<()> {
        Error::check_tag(tags::SET_NICKNAME, response.tag())?;
        match result_code(&response)? {
            0 => Ok(()),
            code => Err(Error::Card {
                function: "setNickname",
                reason: match code {
                    1 => "iccidNotFound",
                    _ => "undefinedError",
                },
                code,
            }),
        }
    }
}
