//! Backend API abstraction.
//!
//! One method per backend route the flows call. Reducers only ever see
//! this trait; [`crate::providers::HttpAuthApi`] is the production
//! implementation and [`crate::mocks::MockAuthApi`] the test one.

use crate::error::Result;
use crate::passkeys::{
    AuthenticationChallenge, AuthenticationResponse, RegistrationChallenge, RegistrationResponse,
};
use crate::recaptcha::RecaptchaToken;
use crate::state::User;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Session material the backend returns when a flow completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    /// Bearer token for authenticated requests.
    pub token: String,

    /// Profile of the now signed-in user.
    pub user: User,
}

/// Error envelope the backend attaches to failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Stable short code flow control dispatches on.
    pub code: String,

    /// Human-readable message, for display only.
    pub message: String,

    /// Email the error refers to, attached to verification-required
    /// rejections.
    pub email: Option<String>,
}

/// Backend routes the authentication flows depend on.
///
/// Pending flows are keyed server-side by email, which is why the start,
/// verify, and resend routes all take one. The passkey-start routes take
/// nothing; the backend resolves them against the flow its verify route
/// just accepted.
pub trait AuthApi: Send + Sync {
    /// Begin signup. On success the backend emails a verification code.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection.
    fn signup_start(&self, email: &str, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Submit a signup verification code.
    ///
    /// # Errors
    ///
    /// [`crate::error::AuthError::InvalidCredentials`] for a wrong or
    /// expired code.
    fn signup_verify(&self, email: &str, code: &str) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the registration challenge for a verified signup.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection.
    fn signup_passkey_start(&self) -> impl Future<Output = Result<RegistrationChallenge>> + Send;

    /// Submit the signup ceremony response and receive a session.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection.
    fn signup_passkey_finish(
        &self,
        response: &RegistrationResponse,
    ) -> impl Future<Output = Result<SessionPayload>> + Send;

    /// Begin login. Without an email the backend issues a discoverable
    /// challenge.
    ///
    /// # Errors
    ///
    /// [`crate::error::AuthError::UserNotFound`] when no account exists,
    /// [`crate::error::AuthError::VerificationRequired`] when the account
    /// never finished verification.
    fn login_start(
        &self,
        email: Option<&str>,
    ) -> impl Future<Output = Result<AuthenticationChallenge>> + Send;

    /// Submit the login ceremony response and receive a session.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection.
    fn login_finish(
        &self,
        response: &AuthenticationResponse,
    ) -> impl Future<Output = Result<SessionPayload>> + Send;

    /// Begin recovery, carrying a bot-detection token when one exists.
    ///
    /// # Errors
    ///
    /// [`crate::error::AuthError::RecaptchaRequired`] when the backend
    /// demands an interactive challenge.
    fn recovery_start(
        &self,
        email: &str,
        recaptcha: Option<&RecaptchaToken>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Submit a recovery verification code.
    ///
    /// # Errors
    ///
    /// [`crate::error::AuthError::InvalidCredentials`] for a wrong or
    /// expired code.
    fn recovery_verify(&self, email: &str, code: &str) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the registration challenge for a verified recovery.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection.
    fn recovery_passkey_start(&self) -> impl Future<Output = Result<RegistrationChallenge>> + Send;

    /// Submit the recovery ceremony response and receive a session.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection.
    fn recovery_passkey_finish(
        &self,
        response: &RegistrationResponse,
    ) -> impl Future<Output = Result<SessionPayload>> + Send;

    /// Ask for a replacement verification code.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection.
    fn resend_otp(&self, email: &str) -> impl Future<Output = Result<()>> + Send;

    /// Tell the backend an unfinished flow was abandoned so it can drop
    /// the pending state early.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy mapping of the backend's rejection. Callers
    /// treat this as best-effort and log failures instead of surfacing
    /// them.
    fn cancel_pending_flow(&self, email: &str) -> impl Future<Output = Result<()>> + Send;
}
