//! ES10b: functions the LPA calls on the eUICC during download and
//! notification handling

use derive_more::Display;
use nexum_bertlv::{BitString, Tag, Tlv};
use sha2::{Digest, Sha256};

use crate::constants::tags;
use crate::transmitter::CardRequest;
use crate::types::{
    Imei, IsdpAid, NotificationEvent, NotificationMetadata, PendingNotification, TransactionId,
};
use crate::{Error, Result};

/// Name of an `AuthenticateErrorCode` or `DownloadErrorCode`
fn authenticate_error(code: i64) -> &'static str {
    match code {
        1 => "invalidCertificate",
        2 => "invalidSignature",
        3 => "unsupportedCurve",
        4 => "noSessionContext",
        5 => "invalidOid",
        6 => "euiccChallengeMismatch",
        7 => "ciPKUnknown",
        _ => "undefinedError",
    }
}

fn download_error(code: i64) -> &'static str {
    match code {
        1..=4 => authenticate_error(code),
        5 => "invalidTransactionId",
        _ => "undefinedError",
    }
}

/// Read the error code of a `[1] SEQUENCE { transactionId, errorCode }` choice
fn response_error(response: &Tlv) -> Result<Option<i64>> {
    let Some(error) = response.child(tags::CTX_CONSTRUCTED_1) else {
        return Ok(None);
    };
    let code = error
        .child(tags::INTEGER)
        .ok_or(Error::MissingField("errorCode"))?
        .decode()?;
    Ok(Some(code))
}

/// Read the primitive result code of a profile management response
pub(crate) fn result_code(response: &Tlv) -> Result<i64> {
    match response.child(tags::CTX_0) {
        Some(code) => Ok(code.decode()?),
        None => Err(Error::MissingField("result")),
    }
}

/// `GetEuiccChallenge` (`BF2E`), a fresh random challenge
#[derive(Debug, Clone, Copy, Default)]
pub struct GetEuiccChallenge;

impl CardRequest for GetEuiccChallenge {
    type Response = Vec<u8>;

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::constructed(tags::GET_EUICC_CHALLENGE, [])?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Vec<u8>> {
        Error::check_tag(tags::GET_EUICC_CHALLENGE, response.tag())?;
        response
            .child(tags::CTX_0)
            .map(|challenge| challenge.value().to_vec())
            .ok_or(Error::MissingField("euiccChallenge"))
    }
}

/// `GetEuiccInfo1` (`BF20`) or `GetEuiccInfo2` (`BF22`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetEuiccInfo {
    /// Versions and CI keys, sent to the SM-DP+ to start authentication
    Info1,
    /// Full card capabilities
    Info2,
}

impl GetEuiccInfo {
    const fn tag(self) -> Tag {
        match self {
            Self::Info1 => tags::GET_EUICC_INFO1,
            Self::Info2 => tags::GET_EUICC_INFO2,
        }
    }
}

impl CardRequest for GetEuiccInfo {
    type Response = Tlv;

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::constructed(self.tag(), [])?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Tlv> {
        Error::check_tag(self.tag(), response.tag())?;
        Ok(response)
    }
}

/// `AuthenticateServer` (`BF38`), the card's side of mutual authentication
#[derive(Debug, Clone)]
pub struct AuthenticateServer {
    /// `serverSigned1` from InitiateAuthentication
    pub server_signed1: Tlv,
    /// `serverSignature1`
    pub server_signature1: Tlv,
    /// `euiccCiPKIdToBeUsed`
    pub euicc_ci_pkid_to_be_used: Tlv,
    /// `serverCertificate`
    pub server_certificate: Tlv,
    /// Matching ID from the activation code, absent for SM-DS discovery
    pub matching_id: Option<String>,
    /// Device IMEI
    pub imei: Imei,
}

impl AuthenticateServer {
    fn ctx_params1(&self) -> Result<Tlv> {
        let device_info = Tlv::builder(tags::CTX_CONSTRUCTED_1)
            .primitive(tags::CTX_0, self.imei.tac())
            .child_result(Tlv::constructed(tags::CTX_CONSTRUCTED_1, []))
            .primitive(tags::CTX_2, self.imei.as_bytes());
        let matching_id = self
            .matching_id
            .as_deref()
            .map(|id| Tlv::primitive(tags::CTX_0, id.as_bytes()))
            .transpose()?;
        Ok(Tlv::builder(tags::CTX_CONSTRUCTED_0)
            .child_opt(matching_id)
            .child_result(device_info.build())
            .build()?)
    }
}

impl CardRequest for AuthenticateServer {
    type Response = Tlv;

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::builder(tags::AUTHENTICATE_SERVER)
            .child(self.server_signed1.clone())
            .child(self.server_signature1.clone())
            .child(self.euicc_ci_pkid_to_be_used.clone())
            .child(self.server_certificate.clone())
            .child(self.ctx_params1()?)
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Tlv> {
        Error::check_tag(tags::AUTHENTICATE_SERVER, response.tag())?;
        if let Some(code) = response_error(&response)? {
            return Err(Error::Card {
                function: "authenticateServer",
                reason: authenticate_error(code),
                code,
            });
        }
        Ok(response)
    }
}

/// Hash a confirmation code for PrepareDownload
///
/// The result is `SHA256(SHA256(code) || transactionId)`.
pub fn hash_confirmation_code(code: &str, transaction_id: &TransactionId) -> [u8; 32] {
    let inner = Sha256::digest(code.as_bytes());
    Sha256::new()
        .chain_update(inner)
        .chain_update(transaction_id.as_bytes())
        .finalize()
        .into()
}

/// `PrepareDownload` (`BF21`), binding the offered profile to this card
#[derive(Debug, Clone)]
pub struct PrepareDownload {
    /// `smdpSigned2` from AuthenticateClient
    pub smdp_signed2: Tlv,
    /// `smdpSignature2`
    pub smdp_signature2: Tlv,
    /// Hashed confirmation code, when the profile requires one
    pub hashed_confirmation_code: Option<[u8; 32]>,
    /// `smdpCertificate`
    pub smdp_certificate: Tlv,
}

impl PrepareDownload {
    /// Whether `smdpSigned2` asks for a confirmation code
    pub fn confirmation_code_required(smdp_signed2: &Tlv) -> bool {
        smdp_signed2
            .first(tags::BOOLEAN)
            .and_then(|flag| flag.decode::<bool>().ok())
            .unwrap_or(false)
    }
}

impl CardRequest for PrepareDownload {
    type Response = Tlv;

    fn to_tlv(&self) -> Result<Tlv> {
        let hashed_confirmation_code = self
            .hashed_confirmation_code
            .map(|hash| Tlv::primitive(tags::OCTET_STRING, hash))
            .transpose()?;
        Ok(Tlv::builder(tags::PREPARE_DOWNLOAD)
            .child(self.smdp_signed2.clone())
            .child(self.smdp_signature2.clone())
            .child_opt(hashed_confirmation_code)
            .child(self.smdp_certificate.clone())
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Tlv> {
        Error::check_tag(tags::PREPARE_DOWNLOAD, response.tag())?;
        if let Some(code) = response_error(&response)? {
            return Err(Error::Card {
                function: "prepareDownload",
                reason: download_error(code),
                code,
            });
        }
        Ok(response)
    }
}

/// Reason given to the card and the SM-DP+ for abandoning a download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CancelSessionReason {
    /// The user declined the profile
    #[display("endUserRejection")]
    EndUserRejection,
    /// The user postponed the download
    #[display("postponed")]
    Postponed,
    /// The user did not respond in time
    #[display("timeout")]
    Timeout,
    /// Profile policy rules cannot be accepted
    #[display("pprNotAllowed")]
    PprNotAllowed,
    /// Offered metadata does not match
    #[display("metadataMismatch")]
    MetadataMismatch,
    /// Loading the bound profile package failed
    #[display("loadBppExecutionError")]
    LoadBppExecutionError,
    /// Any other reason
    #[display("undefinedReason")]
    Undefined,
}

impl CancelSessionReason {
    /// Numeric value sent to the card
    pub const fn code(self) -> i8 {
        match self {
            Self::EndUserRejection => 0,
            Self::Postponed => 1,
            Self::Timeout => 2,
            Self::PprNotAllowed => 3,
            Self::MetadataMismatch => 4,
            Self::LoadBppExecutionError => 5,
            Self::Undefined => 127,
        }
    }
}

/// `CancelSession` (`BF41`), producing a signed cancellation for the SM-DP+
#[derive(Debug, Clone)]
pub struct CancelSession {
    /// Session to cancel
    pub transaction_id: TransactionId,
    /// Why it is cancelled
    pub reason: CancelSessionReason,
}

impl CardRequest for CancelSession {
    type Response = Tlv;

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::builder(tags::CANCEL_SESSION)
            .primitive(tags::CTX_0, self.transaction_id.as_bytes())
            .encode(tags::CTX_1, &self.reason.code())
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Tlv> {
        Error::check_tag(tags::CANCEL_SESSION, response.tag())?;
        if let Some(code) = response.child(tags::INTEGER) {
            let code = code.decode()?;
            return Err(Error::Card {
                function: "cancelSession",
                reason: match code {
                    5 => "invalidTransactionId",
                    _ => "undefinedError",
                },
                code,
            });
        }
        Ok(response)
    }
}

/// `ListNotification` (`BF28`), metadata of the notifications waiting on the card
///
/// An empty filter lists every notification.
#[derive(Debug, Clone, Default)]
pub struct ListNotification {
    /// Events to include
    pub filter: Vec<NotificationEvent>,
}

impl CardRequest for ListNotification {
    type Response = Vec<NotificationMetadata>;

    fn to_tlv(&self) -> Result<Tlv> {
        let filter = (!self.filter.is_empty())
            .then(|| Tlv::encode(tags::CTX_1, &BitString::from_flags(self.filter.iter().copied())))
            .transpose()?;
        Ok(Tlv::builder(tags::LIST_NOTIFICATION)
            .child_opt(filter)
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Self::Response> {
        Error::check_tag(tags::LIST_NOTIFICATION, response.tag())?;
        if let Some(code) = response.child(tags::CTX_1) {
            let code = code.decode()?;
            return Err(Error::Card {
                function: "listNotification",
                reason: "undefinedError",
                code,
            });
        }
        response
            .child(tags::CTX_CONSTRUCTED_0)
            .map(Tlv::children)
            .unwrap_or_default()
            .iter()
            .map(NotificationMetadata::from_tlv)
            .collect()
    }
}

/// Criteria selecting notifications to retrieve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSearch {
    /// A single notification by sequence number
    SequenceNumber(i64),
    /// All notifications for one event
    Event(NotificationEvent),
}

/// `RetrieveNotificationsList` (`BF2B`), the signed notifications themselves
#[derive(Debug, Clone, Default)]
pub struct RetrieveNotificationsList {
    /// Restrict the result, or retrieve everything
    pub search: Option<NotificationSearch>,
}

impl CardRequest for RetrieveNotificationsList {
    type Response = Vec<PendingNotification>;

    fn to_tlv(&self) -> Result<Tlv> {
        let criteria = match self.search {
            Some(NotificationSearch::SequenceNumber(sequence)) => Some(
                Tlv::builder(tags::CTX_CONSTRUCTED_0)
                    .encode(tags::CTX_0, &sequence)
                    .build()?,
            ),
            Some(NotificationSearch::Event(event)) => Some(
                Tlv::builder(tags::CTX_CONSTRUCTED_0)
                    .encode(tags::CTX_1, &BitString::from_flags([event]))
                    .build()?,
            ),
            None => None,
        };
        Ok(Tlv::builder(tags::RETRIEVE_NOTIFICATIONS_LIST)
            .child_opt(criteria)
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<Self::Response> {
        Error::check_tag(tags::RETRIEVE_NOTIFICATIONS_LIST, response.tag())?;
        if let Some(code) = response.child(tags::CTX_1) {
            let code = code.decode()?;
            return Err(Error::Card {
                function: "retrieveNotificationsList",
                reason: match code {
                    1 => "noResultAvailable",
                    _ => "undefinedError",
                },
                code,
            });
        }
        response
            .into_children()
            .into_iter()
            .find(|child| child.tag() == tags::CTX_CONSTRUCTED_0)
            .map(Tlv::into_children)
            .unwrap_or_default()
            .into_iter()
            .map(PendingNotification::from_tlv)
            .collect()
    }
}

/// `NotificationSent` (`BF30`), removing a delivered notification
#[derive(Debug, Clone, Copy)]
pub struct RemoveNotificationFromList {
    /// Sequence number of the notification
    pub sequence_number: i64,
}

impl CardRequest for RemoveNotificationFromList {
    type Response = ();

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::builder(tags::REMOVE_NOTIFICATION)
            .encode(tags::CTX_0, &self.sequence_number)
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<()> {
        Error::check_tag(tags::REMOVE_NOTIFICATION, response.tag())?;
        match result_code(&response)? {
            0 => Ok(()),
            code => Err(Error::Card {
                function: "removeNotificationFromList",
                reason: match code {
                    1 => "nothingToDelete",
                    _ => "undefinedError",
                },
                code,
            }),
        }
    }
}

fn bpp_command(id: i64) -> &'static str {
    match id {
        0 => "initialiseSecureChannel",
        1 => "configureISDP",
        2 => "storeMetadata",
        3 => "storeMetadata2",
        4 => "replaceSessionKeys",
        5 => "loadProfileElements",
        _ => "unknownCommand",
    }
}

fn bpp_error_reason(reason: i64) -> &'static str {
    match reason {
        1 => "incorrectInputValues",
        2 => "invalidSignature",
        3 => "invalidTransactionId",
        4 => "unsupportedCrtValues",
        5 => "unsupportedRemoteOperationType",
        6 => "unsupportedProfileClass",
        7 => "scp03tStructureError",
        8 => "scp03tSecurityError",
        9 => "installFailedDueToIccidAlreadyExistsOnEuicc",
        10 => "installFailedDueToInsufficientMemoryForProfile",
        11 => "installFailedDueToInterruption",
        12 => "installFailedDueToPEProcessingError",
        13 => "installFailedDueToDataMismatch",
        14 => "testProfileInstallFailedDueToInvalidNaaKey",
        15 => "pprNotAllowed",
        _ => "installFailedDueToUnknownError",
    }
}

/// Outcome of loading a bound profile package (`BF37`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInstallationResult {
    /// Download session
    pub transaction_id: TransactionId,
    /// Install notification queued on the card
    pub notification: NotificationMetadata,
    /// ISD-P holding the new profile
    pub isdp_aid: Option<IsdpAid>,
    /// The signed result as returned by the card
    pub result: Tlv,
}

impl ProfileInstallationResult {
    /// Parse the result, failing if the card reports an installation error
    pub fn from_tlv(result: Tlv) -> Result<Self> {
        Error::check_tag(tags::PROFILE_INSTALLATION_RESULT, result.tag())?;
        let data = result
            .child(tags::PROFILE_INSTALLATION_RESULT_DATA)
            .ok_or(Error::MissingField("profileInstallationResultData"))?;
        let final_result = data
            .child(tags::CTX_CONSTRUCTED_2)
            .ok_or(Error::MissingField("finalResult"))?;

        if let Some(error) = final_result.child(tags::CTX_CONSTRUCTED_1) {
            let field = |tag: Tag| match error.child(tag) {
                Some(value) => value.decode::<i64>().map(Some),
                None => Ok(None),
            };
            return Err(Error::LoadBoundProfilePackage {
                command: field(tags::CTX_0)?.map_or("unknownCommand", bpp_command),
                reason: bpp_error_reason(field(tags::CTX_1)?.unwrap_or_default()),
            });
        }

        let transaction_id = data
            .child(tags::CTX_0)
            .map(|id| TransactionId::new(id.value()))
            .ok_or(Error::MissingField("transactionId"))?;
        let notification = NotificationMetadata::from_tlv(
            data.child(tags::NOTIFICATION_METADATA)
                .ok_or(Error::MissingField("notificationMetadata"))?,
        )?;
        let isdp_aid = final_result
            .select(&[tags::CTX_CONSTRUCTED_0, tags::ISDP_AID])
            .map(|aid| IsdpAid::new(aid.value()))
            .transpose()?;

        Ok(Self {
            transaction_id,
            notification,
            isdp_aid,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn tlv(bytes: &[u8]) -> Tlv {
        Tlv::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_challenge() {
        assert_eq!(GetEuiccChallenge.to_tlv().unwrap().to_bytes().unwrap(), hex!("BF2E00"));
        let challenge = GetEuiccChallenge
            .parse_response(tlv(&hex!("BF2E 06 80 04 01020304")))
            .unwrap();
        assert_eq!(challenge, hex!("01020304"));
        assert!(matches!(
            GetEuiccChallenge.parse_response(tlv(&hex!("BF2000"))),
            Err(Error::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn test_authenticate_server_request() {
        let request = AuthenticateServer {
            server_signed1: tlv(&hex!("30 03 80 01 01")),
            server_signature1: tlv(&hex!("5F37 01 AA")),
            euicc_ci_pkid_to_be_used: tlv(&hex!("04 01 BB")),
            server_certificate: tlv(&hex!("30 00")),
            matching_id: Some("AB".into()),
            imei: Imei::new("356938035643809").unwrap(),
        };
        let bytes = request.to_tlv().unwrap().to_bytes().unwrap();
        assert_eq!(
            bytes,
            hex!(
                "BF38 28"
                "30 03 80 01 01"
                "5F37 01 AA"
                "04 01 BB"
                "30 00"
                "A0 18"
                "80 02 41 42"
                "A1 12 80 04 53968330 A1 00 82 08 53968330653408F9"
            )
        );

        let discovery = AuthenticateServer {
            matching_id: None,
            ..request
        };
        assert_eq!(
            discovery.to_tlv().unwrap().to_bytes().unwrap(),
            hex!(
                "BF38 24"
                "30 03 80 01 01"
                "5F37 01 AA"
                "04 01 BB"
                "30 00"
                "A0 14"
                "A1 12 80 04 53968330 A1 00 82 08 53968330653408F9"
            )
        );
    }

    #[test]
    fn test_authenticate_server_error() {
        let err = AuthenticateServer {
            server_signed1: tlv(&hex!("3000")),
            server_signature1: tlv(&hex!("3000")),
            euicc_ci_pkid_to_be_used: tlv(&hex!("3000")),
            server_certificate: tlv(&hex!("3000")),
            matching_id: None,
            imei: Imei::new("356938035643809").unwrap(),
        }
        .parse_response(tlv(&hex!("BF38 08 A1 06 80 01 01 02 01 06")))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "authenticateServer failed: euiccChallengeMismatch (6)"
        );
    }

    #[test]
    fn test_confirmation_code_hash() {
        let transaction_id = TransactionId::new(hex!("0123456789ABCDEF"));
        assert_eq!(
            hash_confirmation_code("1234", &transaction_id),
            hex!("6E9D12E7F7B788BE108E70E1E0D0E59470071F4A7AC1F7A9E1D5FD975647DCF9")
        );
    }

    #[test]
    fn test_prepare_download_request() {
        let signed2 = tlv(&hex!("30 06 80 01 01 01 01 FF"));
        assert!(PrepareDownload::confirmation_code_required(&signed2));
        assert!(!PrepareDownload::confirmation_code_required(&tlv(&hex!(
            "30 06 80 01 01 01 01 00"
        ))));

        let mut request = PrepareDownload {
            smdp_signed2: signed2,
            smdp_signature2: tlv(&hex!("5F37 01 AA")),
            hashed_confirmation_code: None,
            smdp_certificate: tlv(&hex!("30 00")),
        };
        assert_eq!(
            request.to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF21 0E 30 06 80 01 01 01 01 FF 5F37 01 AA 30 00")
        );

        request.hashed_confirmation_code = Some([0x11; 32]);
        let encoded = request.to_tlv().unwrap();
        assert_eq!(encoded.children()[2].tag(), tags::OCTET_STRING);
        assert_eq!(encoded.children()[2].value(), [0x11; 32]);
        assert_eq!(encoded.children()[3].tag(), tags::SEQUENCE);

        let err = request
            .parse_response(tlv(&hex!("BF21 08 A1 06 80 01 01 02 01 05")))
            .unwrap_err();
        assert_eq!(err.to_string(), "prepareDownload failed: invalidTransactionId (5)");
    }

    #[test]
    fn test_cancel_session() {
        let request = CancelSession {
            transaction_id: TransactionId::new(hex!("0102")),
            reason: CancelSessionReason::LoadBppExecutionError,
        };
        assert_eq!(
            request.to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF41 07 80 02 0102 81 01 05")
        );
        assert!(request.parse_response(tlv(&hex!("BF41 02 3000"))).is_ok());
        let err = request.parse_response(tlv(&hex!("BF41 03 02 01 05"))).unwrap_err();
        assert!(matches!(err, Error::Card { code: 5, .. }));
    }

    #[test]
    fn test_list_notification() {
        assert_eq!(
            ListNotification::default().to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF28 00")
        );
        let request = ListNotification {
            filter: vec![NotificationEvent::Install, NotificationEvent::Delete],
        };
        assert_eq!(
            request.to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF28 04 81 02 04 90")
        );

        let list = request
            .parse_response(tlv(&hex!(
                "BF28 0C A0 0A BF2F 07 80 01 03 81 02 04 80"
            )))
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].sequence_number, 3);
        assert_eq!(list[0].event, Some(NotificationEvent::Install));
    }

    #[test]
    fn test_retrieve_notifications_list() {
        let request = RetrieveNotificationsList {
            search: Some(NotificationSearch::SequenceNumber(300)),
        };
        assert_eq!(
            request.to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF2B 06 A0 04 80 02 012C")
        );
        let request = RetrieveNotificationsList {
            search: Some(NotificationSearch::Event(NotificationEvent::Enable)),
        };
        assert_eq!(
            request.to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF2B 06 A0 04 81 02 04 40")
        );

        let list = request
            .parse_response(tlv(&hex!(
                "BF2B 10 A0 0E"
                "30 0C BF2F 09 80 01 07 81 02 04 40 0C 00"
            )))
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].metadata.sequence_number, 7);
        assert_eq!(list[0].notification.tag(), tags::SEQUENCE);

        let err = request.parse_response(tlv(&hex!("BF2B 03 81 01 01"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "retrieveNotificationsList failed: noResultAvailable (1)"
        );
    }

    #[test]
    fn test_remove_notification() {
        let request = RemoveNotificationFromList { sequence_number: 7 };
        assert_eq!(
            request.to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF30 03 80 01 07")
        );
        request.parse_response(tlv(&hex!("BF30 03 80 01 00"))).unwrap();
        let err = request.parse_response(tlv(&hex!("BF30 03 80 01 01"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "removeNotificationFromList failed: nothingToDelete (1)"
        );
    }

    #[test]
    fn test_profile_installation_result() {
        let result = ProfileInstallationResult::from_tlv(tlv(&hex!(
            "BF37 28"
            "BF27 25"
            "80 02 0102"
            "BF2F 09 80 01 01 81 02 04 80 0C 00"
            "A2 13 A0 11 4F 0F A0000005591010FFFFFFFF89000011"
        )))
        .unwrap();
        assert_eq!(result.transaction_id, TransactionId::new(hex!("0102")));
        assert_eq!(result.notification.sequence_number, 1);
        assert_eq!(
            result.isdp_aid.unwrap().to_string(),
            "A0000005591010FFFFFFFF89000011"
        );

        let err = ProfileInstallationResult::from_tlv(tlv(&hex!(
            "BF37 1D"
            "BF27 1A"
            "80 02 0102"
            "BF2F 09 80 01 01 81 02 04 80 0C 00"
            "A2 08 A1 06 80 01 05 81 01 09"
        )))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "load bound profile package failed at loadProfileElements: \
             installFailedDueToIccidAlreadyExistsOnEuicc"
        );
    }
}
