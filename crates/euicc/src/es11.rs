//! ES11: event discovery on an SM-DS
//!
//! An SM-DS authenticates the card the same way an SM-DP+ does, then answers
//! with the events registered for its EID. Each event names the SM-DP+
//! holding a profile and the event ID to download it with.

use nexum_bertlv::Tlv;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::activation_code::ActivationCode;
use crate::constants::es11;
use crate::es9p::ServerRequest;
use crate::types::TransactionId;
use crate::Result;

/// Event registered on the SM-DS for this card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    /// Event ID, used as the matching ID of the download
    pub event_id: String,
    /// SM-DP+ or SM-DS address the event points to
    pub rsp_server_address: String,
}

impl EventEntry {
    /// Base URL of the server the event points to
    pub fn url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("https://{}", self.rsp_server_address))?)
    }

    /// Activation code that downloads the event's profile
    pub fn activation_code(&self) -> ActivationCode {
        ActivationCode::new(&self.rsp_server_address, &self.event_id)
    }
}

/// ES11 `AuthenticateClient` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Es11AuthenticateClientRequest {
    /// RSP session
    pub transaction_id: TransactionId,
    /// AuthenticateServer response from the card
    pub authenticate_server_response: Tlv,
}

/// ES11 `AuthenticateClient` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Es11AuthenticateClientResponse {
    /// RSP session
    pub transaction_id: TransactionId,
    /// Pending events, empty when there are none
    #[serde(default)]
    pub event_entries: Vec<EventEntry>,
}

impl ServerRequest for Es11AuthenticateClientRequest {
    type Response = Es11AuthenticateClientResponse;
    const PATH: &'static str = es11::AUTHENTICATE_CLIENT;
}
