//! eUICC client
//!
//! [`Client`] pairs the card session with the HTTP collaborator used to reach
//! SM-DP+ servers. Card functions are sent through the [`Transmitter`], ES9+
//! functions through the [`HttpClient`].

use nexum_apdu_core::{CardTransport, LogicalChannel};
use tracing::{debug, instrument};
use url::Url;

use crate::constants::{DEFAULT_ADMIN_PROTOCOL_VERSION, DEFAULT_MSS, ISD_R_AID, MAX_MSS};
use crate::es10a::{ConfiguredAddresses, GetEuiccConfiguredAddresses, SetDefaultDpAddress};
use crate::es10b::{
    AuthenticateServer, GetEuiccChallenge, GetEuiccInfo, ListNotification, NotificationSearch,
    RemoveNotificationFromList, RetrieveNotificationsList,
};
use crate::es10c::{
    EuiccMemoryReset, GetEid, GetProfilesInfo, ProfileOperation, ProfileRequest, ResetOption,
    SetNickname,
};
use crate::es11::{Es11AuthenticateClientRequest, EventEntry};
use crate::es9p::{
    self, HandleNotificationRequest, HttpClient, InitiateAuthenticationRequest,
    InitiateAuthenticationResponse, ServerRequest,
};
use crate::transmitter::{CardRequest, Transmitter};
use crate::types::{
    Eid, Iccid, Identifier, Imei, NotificationEvent, NotificationMetadata, PendingNotification,
    ProfileInfo,
};
use crate::{Error, Result};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// AID of the ISD-R selected on the logical channel
    pub aid: Vec<u8>,
    /// Largest data field per STORE DATA segment
    pub mss: usize,
    /// RSP admin protocol version, such as `2.2.2`
    pub admin_protocol_version: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            aid: ISD_R_AID.to_vec(),
            mss: DEFAULT_MSS,
            admin_protocol_version: DEFAULT_ADMIN_PROTOCOL_VERSION.to_owned(),
        }
    }
}

impl ClientOptions {
    /// Select a different ISD-R AID
    pub fn with_aid(mut self, aid: impl Into<Vec<u8>>) -> Self {
        self.aid = aid.into();
        self
    }

    /// Set the maximum segment size
    pub const fn with_mss(mut self, mss: usize) -> Self {
        self.mss = mss;
        self
    }

    /// Set the admin protocol version, with or without a leading `v`
    pub fn with_admin_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.admin_protocol_version = version.into();
        self
    }

    fn version(&self) -> &str {
        let version = self.admin_protocol_version.trim();
        version.strip_prefix('v').unwrap_or(version)
    }

    /// Check every option is in range
    pub fn validate(&self) -> Result<()> {
        if !(5..=16).contains(&self.aid.len()) {
            return Err(Error::InvalidOptions(format!(
                "AID must be 5 to 16 bytes, got {}",
                self.aid.len()
            )));
        }
        if !(1..=MAX_MSS).contains(&self.mss) {
            return Err(Error::InvalidOptions(format!(
                "MSS must be between 1 and {MAX_MSS}, got {}",
                self.mss
            )));
        }
        let version = self.version();
        let mut parts = version.split('.');
        if parts.next() != Some("2") || !parts.all(|part| part.parse::<u8>().is_ok()) {
            return Err(Error::InvalidOptions(format!(
                "unsupported admin protocol version {version}"
            )));
        }
        Ok(())
    }

    /// Value of the `X-Admin-Protocol` header
    pub fn admin_protocol(&self) -> String {
        format!("gsma/rsp/v{}", self.version())
    }
}

/// LPA client for one eUICC
#[derive(Debug)]
pub struct Client<T, H> {
    transmitter: T,
    http: H,
    admin_protocol: String,
}

impl<T: Transmitter, H: HttpClient> Client<T, H> {
    /// Client over an open card session
    ///
    /// Only the admin protocol version is taken from `options`; the session
    /// was opened with its own AID and MSS.
    pub fn new(transmitter: T, http: H, options: &ClientOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            transmitter,
            http,
            admin_protocol: options.admin_protocol(),
        })
    }

    /// Card session
    pub const fn transmitter(&self) -> &T {
        &self.transmitter
    }

    /// HTTP collaborator
    pub const fn http(&self) -> &H {
        &self.http
    }

    /// Take the card session and HTTP collaborator back
    pub fn into_parts(self) -> (T, H) {
        (self.transmitter, self.http)
    }

    /// Send any card function
    pub fn invoke<R: CardRequest>(&self, request: &R) -> Result<R::Response> {
        self.transmitter.invoke(request)
    }

    /// Call any ES9+ function on the SM-DP+ at `smdp`
    pub fn call_server<R: ServerRequest>(&self, smdp: &Url, request: &R) -> Result<R::Response> {
        es9p::invoke(&self.http, smdp, &self.admin_protocol, request)
    }

    /// Open an RSP session with the SM-DP+ or SM-DS at `server`
    ///
    /// Sends a fresh card challenge and `EUICCInfo1` to `initiateAuthentication`.
    pub fn initiate_authentication(&self, server: &Url) -> Result<InitiateAuthenticationResponse> {
        let smdp_address = server.host_str().ok_or(url::ParseError::EmptyHost)?;
        self.call_server(
            server,
            &InitiateAuthenticationRequest {
                euicc_challenge: self.euicc_challenge()?,
                euicc_info1: self.euicc_info1()?,
                smdp_address: smdp_address.to_owned(),
            },
        )
    }

    //
    // ES10a
    //

    /// Default SM-DP+ and root SM-DS addresses
    pub fn configured_addresses(&self) -> Result<ConfiguredAddresses> {
        self.invoke(&GetEuiccConfiguredAddresses)
    }

    /// Set the default SM-DP+ address, or clear it with an empty string
    pub fn set_default_dp_address(&self, address: impl Into<String>) -> Result<()> {
        self.invoke(&SetDefaultDpAddress {
            address: address.into(),
        })
    }

    //
    // ES10b
    //

    /// Fresh challenge from the card
    pub fn euicc_challenge(&self) -> Result<Vec<u8>> {
        self.invoke(&GetEuiccChallenge)
    }

    /// `EUICCInfo1`
    pub fn euicc_info1(&self) -> Result<nexum_bertlv::Tlv> {
        self.invoke(&GetEuiccInfo::Info1)
    }

    /// `EUICCInfo2`
    pub fn euicc_info2(&self) -> Result<nexum_bertlv::Tlv> {
        self.invoke(&GetEuiccInfo::Info2)
    }

    /// Metadata of pending notifications, for the given events or all of them
    pub fn list_notifications(
        &self,
        filter: &[NotificationEvent],
    ) -> Result<Vec<NotificationMetadata>> {
        self.invoke(&ListNotification {
            filter: filter.to_vec(),
        })
    }

    /// Signed pending notifications
    pub fn retrieve_notifications(
        &self,
        search: Option<NotificationSearch>,
    ) -> Result<Vec<PendingNotification>> {
        self.invoke(&RetrieveNotificationsList { search })
    }

    /// Remove a delivered notification from the card
    pub fn remove_notification(&self, sequence_number: i64) -> Result<()> {
        self.invoke(&RemoveNotificationFromList { sequence_number })
    }

    /// Deliver a notification to the server named in its metadata
    pub fn send_notification(&self, notification: &PendingNotification) -> Result<()> {
        let smdp = Url::parse(&format!("https://{}", notification.metadata.address))?;
        self.call_server(
            &smdp,
            &HandleNotificationRequest {
                pending_notification: notification.notification.clone(),
            },
        )?;
        Ok(())
    }

    /// Deliver a notification and then remove it from the card
    #[instrument(skip_all, fields(sequence_number = notification.metadata.sequence_number))]
    pub fn handle_notification(&self, notification: &PendingNotification) -> Result<()> {
        self.send_notification(notification)?;
        self.remove_notification(notification.metadata.sequence_number)?;
        debug!(address = %notification.metadata.address, "Notification handled");
        Ok(())
    }

    /// Deliver and remove every pending notification matching `search`
    ///
    /// Stops at the first failure. Returns how many were handled.
    pub fn handle_notifications(&self, search: Option<NotificationSearch>) -> Result<usize> {
        let notifications = self.retrieve_notifications(search)?;
        for notification in &notifications {
            self.handle_notification(notification)?;
        }
        Ok(notifications.len())
    }

    //
    // ES11
    //

    /// Events registered for this card on the SM-DS at `smds`
    #[instrument(skip_all, fields(smds = %smds))]
    pub fn discover(&self, smds: &Url, imei: &Imei) -> Result<Vec<EventEntry>> {
        let initiated = self.initiate_authentication(smds)?;
        let authenticate_server_response = self.invoke(&AuthenticateServer {
            server_signed1: initiated.server_signed1,
            server_signature1: initiated.server_signature1,
            euicc_ci_pkid_to_be_used: initiated.euicc_ci_pkid_to_be_used,
            server_certificate: initiated.server_certificate,
            matching_id: None,
            imei: imei.clone(),
        })?;
        let response = self.call_server(
            smds,
            &Es11AuthenticateClientRequest {
                transaction_id: initiated.transaction_id,
                authenticate_server_response,
            },
        )?;
        debug!(events = response.event_entries.len(), "Discovered events");
        Ok(response.event_entries)
    }

    //
    // ES10c
    //

    /// All installed profiles
    pub fn profiles(&self) -> Result<Vec<ProfileInfo>> {
        self.invoke(&GetProfilesInfo::default())
    }

    /// Installed profile with the given identifier, if any
    pub fn profile(&self, identifier: Identifier) -> Result<Option<ProfileInfo>> {
        let mut profiles = self.invoke(&GetProfilesInfo {
            search: Some(identifier.into()),
            tags: Vec::new(),
        })?;
        Ok(profiles.pop())
    }

    /// Enable a profile
    pub fn enable_profile(&self, identifier: Identifier, refresh: bool) -> Result<()> {
        self.change_profile(ProfileOperation::Enable, identifier, refresh)
    }

    /// Disable a profile
    pub fn disable_profile(&self, identifier: Identifier, refresh: bool) -> Result<()> {
        self.change_profile(ProfileOperation::Disable, identifier, refresh)
    }

    /// Delete a disabled profile
    pub fn delete_profile(&self, identifier: Identifier) -> Result<()> {
        self.change_profile(ProfileOperation::Delete, identifier, false)
    }

    fn change_profile(
        &self,
        operation: ProfileOperation,
        identifier: Identifier,
        refresh: bool,
    ) -> Result<()> {
        debug!(operation = operation.function(), ?identifier, "Changing profile");
        self.invoke(&ProfileRequest {
            operation,
            identifier,
            refresh,
        })
    }

    /// Reset card memory
    pub fn memory_reset(&self, options: &[ResetOption]) -> Result<()> {
        self.invoke(&EuiccMemoryReset {
            options: options.to_vec(),
        })
    }

    /// eUICC identifier
    pub fn eid(&self) -> Result<Eid> {
        self.invoke(&GetEid)
    }

    /// Set or clear the nickname of a profile
    pub fn set_nickname(&self, iccid: Iccid, nickname: &str) -> Result<()> {
        self.invoke(&SetNickname::new(iccid, nickname)?)
    }
}

impl<C: CardTransport, H: HttpClient> Client<LogicalChannel<C>, H> {
    /// Connect `transport`, open a logical channel to the ISD-R and build a client
    pub fn open(transport: C, http: H, options: &ClientOptions) -> Result<Self> {
        options.validate()?;
        let channel = LogicalChannel::open(transport, &options.aid, options.mss)?;
        Self::new(channel, http, options)
    }

    /// Close the logical channel and disconnect the card
    pub fn close(self) -> Result<()> {
        let (channel, _) = self.into_parts();
        Ok(channel.close()?)
    }
}
