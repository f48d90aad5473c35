//! ES9+: functions the LPA calls on the SM-DP+
//!
//! Requests and responses are JSON objects. TLV fields travel as base64
//! strings and transaction IDs as uppercase hex. Every response carries a
//! `header.functionExecutionStatus`, which is checked before any other field
//! of the body is looked at.

use std::fmt;

use nexum_bertlv::Tlv;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::constants::es9;
use crate::types::TransactionId;
use crate::{Error, Result};

/// `functionExecutionStatus.status` of a successful call
pub const EXECUTED_SUCCESS: &str = "Executed-Success";

/// Subject and reason of a failed server function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCodeData {
    /// Subject code
    #[serde(default)]
    pub subject_code: String,
    /// Reason code
    #[serde(default)]
    pub reason_code: String,
    /// Identifier of the subject, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_identifier: Option<String>,
    /// Human readable explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl fmt::Display for StatusCodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => write!(
                f,
                "{message} (subject {}, reason {})",
                self.subject_code, self.reason_code
            ),
            _ => write!(f, "subject {}, reason {}", self.subject_code, self.reason_code),
        }
    }
}

/// `functionExecutionStatus`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    /// `Executed-Success`, `Executed-WithWarning`, `Failed` or `Expired`
    pub status: String,
    /// Failure details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code_data: Option<StatusCodeData>,
}

/// Common response header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Outcome of the call
    pub function_execution_status: ExecutionStatus,
    /// Identifier of the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_requester_identifier: Option<String>,
    /// Identifier of this call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call_identifier: Option<String>,
}

impl Header {
    /// Fail unless the function executed successfully
    pub fn check(self) -> Result<()> {
        let status = self.function_execution_status;
        if status.status == EXECUTED_SUCCESS {
            return Ok(());
        }
        Err(Error::Server {
            status: status.status,
            data: status.status_code_data.unwrap_or_default(),
        })
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(de::Error::custom)
    }
}

/// An ES9+ function call
pub trait ServerRequest: Serialize {
    /// Body of a successful response
    type Response: DeserializeOwned;

    /// Path of the function below the SM-DP+ address
    const PATH: &'static str;

    /// Whether the response carries a header to check
    const HAS_HEADER: bool = true;
}

/// `InitiateAuthentication` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateAuthenticationRequest {
    /// Challenge from GetEuiccChallenge
    #[serde(with = "base64_bytes")]
    pub euicc_challenge: Vec<u8>,
    /// `euiccInfo1` from the card
    pub euicc_info1: Tlv,
    /// SM-DP+ address as given in the activation code
    pub smdp_address: String,
}

/// `InitiateAuthentication` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateAuthenticationResponse {
    /// New RSP session
    pub transaction_id: TransactionId,
    /// Signed server data
    pub server_signed1: Tlv,
    /// Signature over `serverSigned1`
    pub server_signature1: Tlv,
    /// CI public key the card must use
    #[serde(rename = "euiccCiPKIdToBeUsed")]
    pub euicc_ci_pkid_to_be_used: Tlv,
    /// SM-DP+ authentication certificate
    pub server_certificate: Tlv,
}

impl ServerRequest for InitiateAuthenticationRequest {
    type Response = InitiateAuthenticationResponse;
    const PATH: &'static str = es9::INITIATE_AUTHENTICATION;
}

/// `AuthenticateClient` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateClientRequest {
    /// RSP session
    pub transaction_id: TransactionId,
    /// AuthenticateServer response from the card
    pub authenticate_server_response: Tlv,
}

/// `AuthenticateClient` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateClientResponse {
    /// RSP session
    pub transaction_id: TransactionId,
    /// Offered profile (`BF25`)
    pub profile_metadata: Tlv,
    /// Signed server data
    pub smdp_signed2: Tlv,
    /// Signature over `smdpSigned2`
    pub smdp_signature2: Tlv,
    /// SM-DP+ profile binding certificate
    pub smdp_certificate: Tlv,
}

impl ServerRequest for AuthenticateClientRequest {
    type Response = AuthenticateClientResponse;
    const PATH: &'static str = es9::AUTHENTICATE_CLIENT;
}

/// `GetBoundProfilePackage` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoundProfilePackageRequest {
    /// RSP session
    pub transaction_id: TransactionId,
    /// PrepareDownload response from the card
    pub prepare_download_response: Tlv,
}

/// `GetBoundProfilePackage` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoundProfilePackageResponse {
    /// RSP session
    pub transaction_id: TransactionId,
    /// Bound profile package (`BF36`)
    pub bound_profile_package: Tlv,
}

impl ServerRequest for GetBoundProfilePackageRequest {
    type Response = GetBoundProfilePackageResponse;
    const PATH: &'static str = es9::GET_BOUND_PROFILE_PACKAGE;
}

/// `HandleNotification` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleNotificationRequest {
    /// Signed notification from the card
    pub pending_notification: Tlv,
}

/// Response of functions that return nothing but their header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}

impl ServerRequest for HandleNotificationRequest {
    type Response = EmptyResponse;
    const PATH: &'static str = es9::HANDLE_NOTIFICATION;
    const HAS_HEADER: bool = false;
}

/// `CancelSession` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSessionRequest {
    /// RSP session
    pub transaction_id: TransactionId,
    /// CancelSession response from the card
    pub cancel_session_response: Tlv,
}

impl ServerRequest for CancelSessionRequest {
    type Response = EmptyResponse;
    const PATH: &'static str = es9::CANCEL_SESSION;
}

/// One POST to the SM-DP+
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Function URL
    pub url: Url,
    /// Value of the `X-Admin-Protocol` header
    pub admin_protocol: String,
    /// JSON body
    pub body: Value,
}

/// Transport for ES9+ calls
///
/// Implementations POST the body with `Content-Type: application/json` and
/// return the decoded JSON response, or `null` for an empty body.
pub trait HttpClient {
    /// Transport failure
    type Error: Into<Error>;

    /// Send one request
    fn send_request(&self, request: HttpRequest) -> std::result::Result<Value, Self::Error>;
}

impl<H: HttpClient> HttpClient for &H {
    type Error = H::Error;

    fn send_request(&self, request: HttpRequest) -> std::result::Result<Value, Self::Error> {
        (**self).send_request(request)
    }
}

/// Call an ES9+ function on the SM-DP+ at `smdp`
pub fn invoke<H, R>(http: &H, smdp: &Url, admin_protocol: &str, request: &R) -> Result<R::Response>
where
    H: HttpClient,
    R: ServerRequest,
{
    let url = smdp.join(R::PATH)?;
    debug!(%url, "Calling ES9+ function");
    let response = http
        .send_request(HttpRequest {
            url,
            admin_protocol: admin_protocol.to_owned(),
            body: serde_json::to_value(request)?,
        })
        .map_err(Into::into)?;

    let response = match response {
        Value::Null => Value::Object(serde_json::Map::new()),
        response => response,
    };
    if R::HAS_HEADER {
        let header = response.get("header").ok_or(Error::MissingField("header"))?;
        Header::deserialize(header)?.check()?;
    }
    Ok(serde_json::from_value(response)?)
}
