//! Profile download
//!
//! A download runs three ES9+ round trips with the SM-DP+ and ends by loading
//! the bound profile package onto the card:
//!
//! 1. **AuthenticateClient**: the card and the SM-DP+ authenticate each other
//!    and the SM-DP+ offers the profile metadata
//! 2. **AuthenticateServer**: after the user accepts, the card prepares the
//!    download and the SM-DP+ binds the profile package to it
//! 3. **Install**: the package is loaded segment by segment
//!
//! Once the SM-DP+ has opened a session, every failure or cancellation
//! closes it with `CancelSession` before returning.

use std::fmt;

use derive_more::Display;
use nexum_bertlv::Tlv;
use tracing::{debug, instrument, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::activation_code::ActivationCode;
use crate::bpp;
use crate::cancel::CancellationToken;
use crate::client::Client;
use crate::es10b::{
    AuthenticateServer, CancelSession, CancelSessionReason, PrepareDownload,
    ProfileInstallationResult, hash_confirmation_code,
};
use crate::es9p::{
    AuthenticateClientRequest, CancelSessionRequest, GetBoundProfilePackageRequest, HttpClient,
};
use crate::transmitter::Transmitter;
use crate::types::{ProfileInfo, TransactionId};
use crate::{Error, Result};

/// Download stage reported to [`DownloadPolicy::progress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DownloadStage {
    /// Mutual authentication and profile offer
    #[display("authenticate client")]
    AuthenticateClient,
    /// Profile binding after the user accepted
    #[display("authenticate server")]
    AuthenticateServer,
    /// Loading the bound profile package
    #[display("install")]
    Install,
}

/// Decisions a download needs from the user
pub trait DownloadPolicy {
    /// A stage is starting
    fn progress(&self, _stage: DownloadStage) {}

    /// Whether to install the offered profile
    fn confirm(&self, _metadata: &ProfileInfo) -> bool {
        true
    }

    /// Ask for the confirmation code, returning an empty string if none is given
    fn confirmation_code(&self) -> String {
        String::new()
    }
}

impl<P: DownloadPolicy + ?Sized> DownloadPolicy for &P {
    fn progress(&self, stage: DownloadStage) {
        (**self).progress(stage);
    }

    fn confirm(&self, metadata: &ProfileInfo) -> bool {
        (**self).confirm(metadata)
    }

    fn confirmation_code(&self) -> String {
        (**self).confirmation_code()
    }
}

/// Type for function notified of download progress
pub type ProgressFn = Box<dyn Fn(DownloadStage) + Send + Sync>;
/// Type for function that accepts or declines the offered profile
pub type ConfirmationFn = Box<dyn Fn(&ProfileInfo) -> bool + Send + Sync>;
/// Type for function that provides an input string (ie. confirmation code)
pub type InputRequestFn = Box<dyn Fn(&str) -> String + Send + Sync>;

/// [`DownloadPolicy`] backed by optional callbacks
///
/// Without callbacks every profile is accepted and no confirmation code is
/// supplied.
#[derive(Default)]
pub struct CallbackPolicy {
    progress: Option<ProgressFn>,
    confirmation: Option<ConfirmationFn>,
    input_request: Option<InputRequestFn>,
}

impl CallbackPolicy {
    /// Policy that accepts every profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Report progress to `callback`
    pub fn with_progress(
        mut self,
        callback: impl Fn(DownloadStage) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Ask `callback` whether to install the offered profile
    pub fn with_confirmation(
        mut self,
        callback: impl Fn(&ProfileInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.confirmation = Some(Box::new(callback));
        self
    }

    /// Ask `callback` for the confirmation code
    pub fn with_input_request(
        mut self,
        callback: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.input_request = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for CallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackPolicy")
            .field("progress", &self.progress.is_some())
            .field("confirmation", &self.confirmation.is_some())
            .field("input_request", &self.input_request.is_some())
            .finish()
    }
}

impl DownloadPolicy for CallbackPolicy {
    fn progress(&self, stage: DownloadStage) {
        if let Some(callback) = &self.progress {
            callback(stage);
        }
    }

    fn confirm(&self, metadata: &ProfileInfo) -> bool {
        self.confirmation
            .as_ref()
            .is_none_or(|callback| callback(metadata))
    }

    fn confirmation_code(&self) -> String {
        self.input_request
            .as_ref()
            .map(|callback| callback("Enter confirmation code"))
            .unwrap_or_default()
    }
}

/// How a download ended when no error occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The profile is installed
    Installed(ProfileInstallationResult),
    /// The user declined the offered profile
    Declined,
    /// The cancellation token was triggered
    Cancelled,
}

/// State shared by the stages of one download
struct Session<'a> {
    smdp: Url,
    transaction_id: TransactionId,
    token: &'a CancellationToken,
}

impl<T: Transmitter, H: HttpClient> Client<T, H> {
    /// Download and install the profile an activation code points to
    ///
    /// Returns [`DownloadOutcome::Declined`] or [`DownloadOutcome::Cancelled`]
    /// after the SM-DP+ session was cancelled. If cancelling fails as well,
    /// both errors are returned in [`Error::Aborted`].
    #[instrument(skip_all, fields(smdp = %code.smdp_address))]
    pub fn download_profile<P: DownloadPolicy>(
        &self,
        code: &ActivationCode,
        policy: P,
        token: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        code.validate()?;
        let imei = code.imei.clone().ok_or(Error::InvalidActivationCode("missing IMEI"))?;
        if token.is_cancelled() {
            return Ok(DownloadOutcome::Cancelled);
        }

        // AuthenticateClient
        self.enter(&policy, DownloadStage::AuthenticateClient);
        let smdp = code.smdp_url()?;
        let initiated = self.initiate_authentication(&smdp)?;
        let session = Session {
            smdp,
            transaction_id: initiated.transaction_id,
            token,
        };
        debug!(transaction_id = %session.transaction_id, "Opened RSP session");

        let authenticate_server = self
            .invoke(&AuthenticateServer {
                server_signed1: initiated.server_signed1,
                server_signature1: initiated.server_signature1,
                euicc_ci_pkid_to_be_used: initiated.euicc_ci_pkid_to_be_used,
                server_certificate: initiated.server_certificate,
                matching_id: Some(code.matching_id.clone()),
                imei,
            })
            .map_err(|e| self.abort(&session, CancelSessionReason::EndUserRejection, e))?;
        let authenticated = self.call_server(
            &session.smdp,
            &AuthenticateClientRequest {
                transaction_id: session.transaction_id.clone(),
                authenticate_server_response: authenticate_server,
            },
        )?;
        let metadata = ProfileInfo::from_tlv(&authenticated.profile_metadata)
            .map_err(|e| self.abort(&session, CancelSessionReason::EndUserRejection, e))?;

        // Confirm
        if let Some(outcome) = self.check_cancelled(&session)? {
            return Ok(outcome);
        }
        debug!(iccid = %metadata.iccid, name = %metadata.profile_name, "Profile offered");
        if !policy.confirm(&metadata) {
            self.cancel_session(
                &session.smdp,
                &session.transaction_id,
                CancelSessionReason::EndUserRejection,
            )?;
            return Ok(DownloadOutcome::Declined);
        }

        let confirmation_code_required =
            PrepareDownload::confirmation_code_required(&authenticated.smdp_signed2);
        let mut confirmation_code = Zeroizing::new(code.confirmation_code().to_owned());
        if confirmation_code_required && confirmation_code.is_empty() {
            confirmation_code = Zeroizing::new(policy.confirmation_code());
            if confirmation_code.is_empty() {
                return Err(Error::ConfirmationCodeRequired);
            }
        }

        // AuthenticateServer
        self.enter(&policy, DownloadStage::AuthenticateServer);
        if let Some(outcome) = self.check_cancelled(&session)? {
            return Ok(outcome);
        }
        let bound_profile_package = self
            .bind_profile(
                &session,
                PrepareDownload {
                    smdp_signed2: authenticated.smdp_signed2,
                    smdp_signature2: authenticated.smdp_signature2,
                    hashed_confirmation_code: confirmation_code_required.then(|| {
                        hash_confirmation_code(&confirmation_code, &session.transaction_id)
                    }),
                    smdp_certificate: authenticated.smdp_certificate,
                },
            )
            .map_err(|e| self.abort(&session, CancelSessionReason::EndUserRejection, e))?;

        // Install
        self.enter(&policy, DownloadStage::Install);
        if let Some(outcome) = self.check_cancelled(&session)? {
            return Ok(outcome);
        }
        let result = bpp::load(self.transmitter(), &bound_profile_package)
            .map_err(|e| self.abort(&session, CancelSessionReason::LoadBppExecutionError, e))?;
        debug!(
            transaction_id = %result.transaction_id,
            isdp_aid = ?result.isdp_aid,
            "Profile installed"
        );
        Ok(DownloadOutcome::Installed(result))
    }

    /// Cancel an RSP session on the card and then on the SM-DP+
    pub fn cancel_session(
        &self,
        smdp: &Url,
        transaction_id: &TransactionId,
        reason: CancelSessionReason,
    ) -> Result<()> {
        debug!(%transaction_id, %reason, "Cancelling RSP session");
        let response = self.invoke(&CancelSession {
            transaction_id: transaction_id.clone(),
            reason,
        })?;
        self.call_server(
            smdp,
            &CancelSessionRequest {
                transaction_id: transaction_id.clone(),
                cancel_session_response: response,
            },
        )?;
        Ok(())
    }

    fn enter<P: DownloadPolicy>(&self, policy: &P, stage: DownloadStage) {
        debug!(%stage, "Entering download stage");
        policy.progress(stage);
    }

    fn bind_profile(&self, session: &Session<'_>, prepare: PrepareDownload) -> Result<Tlv> {
        let prepared = self.invoke(&prepare)?;
        let response = self.call_server(
            &session.smdp,
            &GetBoundProfilePackageRequest {
                transaction_id: session.transaction_id.clone(),
                prepare_download_response: prepared,
            },
        )?;
        Ok(response.bound_profile_package)
    }

    fn check_cancelled(&self, session: &Session<'_>) -> Result<Option<DownloadOutcome>> {
        if !session.token.is_cancelled() {
            return Ok(None);
        }
        self.cancel_session(
            &session.smdp,
            &session.transaction_id,
            CancelSessionReason::EndUserRejection,
        )?;
        Ok(Some(DownloadOutcome::Cancelled))
    }

    /// Cancel the session after `error`, keeping both errors if that fails too
    fn abort(&self, session: &Session<'_>, reason: CancelSessionReason, error: Error) -> Error {
        warn!(%error, %reason, "Download failed, cancelling session");
        match self.cancel_session(&session.smdp, &session.transaction_id, reason) {
            Ok(()) => error,
            Err(cancel_error) => Error::Aborted {
                source: Box::new(error),
                cancel_error: Box::new(cancel_error),
            },
        }
    }
}
