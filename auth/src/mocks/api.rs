//! Mock backend API for testing.

use crate::codec;
use crate::error::{AuthError, Result};
use crate::passkeys::{
    AuthenticationChallenge, AuthenticationResponse, ChallengeUser, RegistrationChallenge,
    RegistrationResponse, RelyingParty,
};
use crate::providers::api::{AuthApi, SessionPayload};
use crate::recaptcha::RecaptchaToken;
use crate::state::{User, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Backend routes, for failure injection and call inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `signup_start`
    SignupStart,
    /// `signup_verify`
    SignupVerify,
    /// `signup_passkey_start`
    SignupPasskeyStart,
    /// `signup_passkey_finish`
    SignupPasskeyFinish,
    /// `login_start`
    LoginStart,
    /// `login_finish`
    LoginFinish,
    /// `recovery_start`
    RecoveryStart,
    /// `recovery_verify`
    RecoveryVerify,
    /// `recovery_passkey_start`
    RecoveryPasskeyStart,
    /// `recovery_passkey_finish`
    RecoveryPasskeyFinish,
    /// `resend_otp`
    ResendOtp,
    /// `cancel_pending_flow`
    CancelPendingFlow,
}

/// One backend call as the mock observed it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    /// `signup_start` with its form data.
    SignupStart {
        /// Email submitted.
        email: String,
        /// Name submitted.
        name: String,
    },
    /// `signup_verify` with the submitted code.
    SignupVerify {
        /// Email the code belongs to.
        email: String,
        /// The submitted code.
        code: String,
    },
    /// `signup_passkey_start`.
    SignupPasskeyStart,
    /// `signup_passkey_finish`.
    SignupPasskeyFinish,
    /// `login_start`.
    LoginStart {
        /// Email sent, if any.
        email: Option<String>,
    },
    /// `login_finish`.
    LoginFinish,
    /// `recovery_start` with whatever bot-detection token was attached.
    RecoveryStart {
        /// Email submitted.
        email: String,
        /// Token attached to the request.
        recaptcha: Option<RecaptchaToken>,
    },
    /// `recovery_verify` with the submitted code.
    RecoveryVerify {
        /// Email the code belongs to.
        email: String,
        /// The submitted code.
        code: String,
    },
    /// `recovery_passkey_start`.
    RecoveryPasskeyStart,
    /// `recovery_passkey_finish`.
    RecoveryPasskeyFinish,
    /// `resend_otp`.
    ResendOtp {
        /// Email the replacement code goes to.
        email: String,
    },
    /// `cancel_pending_flow`.
    CancelPendingFlow {
        /// Email of the abandoned flow.
        email: String,
    },
}

#[derive(Debug)]
struct MockAuthApiInner {
    calls: Vec<RecordedCall>,
    failures: HashMap<Endpoint, AuthError>,
    registration_challenge: RegistrationChallenge,
    authentication_challenge: AuthenticationChallenge,
    session: SessionPayload,
}

/// Mock [`AuthApi`] with per-endpoint failure injection.
///
/// Every call is recorded. Failures are one-shot: the injected error is
/// consumed by the next call to that endpoint, and the call after that
/// succeeds again, which is what retry tests need.
#[derive(Debug, Clone)]
pub struct MockAuthApi {
    inner: Arc<Mutex<MockAuthApiInner>>,
}

impl MockAuthApi {
    /// Create a mock where every endpoint succeeds with canned payloads.
    #[must_use]
    pub fn new() -> Self {
        let inner = MockAuthApiInner {
            calls: Vec::new(),
            failures: HashMap::new(),
            registration_challenge: default_registration_challenge(),
            authentication_challenge: default_authentication_challenge(),
            session: default_session(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Make the next call to `endpoint` fail with `error`.
    pub fn fail_next(&self, endpoint: Endpoint, error: AuthError) {
        self.lock().failures.insert(endpoint, error);
    }

    /// Replace the registration challenge both passkey-start routes return.
    pub fn set_registration_challenge(&self, challenge: RegistrationChallenge) {
        self.lock().registration_challenge = challenge;
    }

    /// The registration challenge the passkey-start routes will return.
    #[must_use]
    pub fn registration_challenge(&self) -> RegistrationChallenge {
        self.lock().registration_challenge.clone()
    }

    /// Replace the authentication challenge `login_start` returns.
    pub fn set_authentication_challenge(&self, challenge: AuthenticationChallenge) {
        self.lock().authentication_challenge = challenge;
    }

    /// The authentication challenge `login_start` will return.
    #[must_use]
    pub fn authentication_challenge(&self) -> AuthenticationChallenge {
        self.lock().authentication_challenge.clone()
    }

    /// Replace the session every finish route returns.
    pub fn set_session(&self, session: SessionPayload) {
        self.lock().session = session;
    }

    /// Everything called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockAuthApiInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_then_take(&self, call: RecordedCall, endpoint: Endpoint) -> Option<AuthError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        inner.failures.remove(&endpoint)
    }
}

impl Default for MockAuthApi {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthApi for MockAuthApi {
    async fn signup_start(&self, email: &str, name: &str) -> Result<()> {
        let call = RecordedCall::SignupStart {
            email: email.to_string(),
            name: name.to_string(),
        };
        match self.record_then_take(call, Endpoint::SignupStart) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn signup_verify(&self, email: &str, code: &str) -> Result<()> {
        let call = RecordedCall::SignupVerify {
            email: email.to_string(),
            code: code.to_string(),
        };
        match self.record_then_take(call, Endpoint::SignupVerify) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn signup_passkey_start(&self) -> Result<RegistrationChallenge> {
        match self.record_then_take(RecordedCall::SignupPasskeyStart, Endpoint::SignupPasskeyStart)
        {
            Some(error) => Err(error),
            None => Ok(self.lock().registration_challenge.clone()),
        }
    }

    async fn signup_passkey_finish(
        &self,
        _response: &RegistrationResponse,
    ) -> Result<SessionPayload> {
        match self.record_then_take(RecordedCall::SignupPasskeyFinish, Endpoint::SignupPasskeyFinish)
        {
            Some(error) => Err(error),
            None => Ok(self.lock().session.clone()),
        }
    }

    async fn login_start(&self, email: Option<&str>) -> Result<AuthenticationChallenge> {
        let call = RecordedCall::LoginStart {
            email: email.map(str::to_string),
        };
        match self.record_then_take(call, Endpoint::LoginStart) {
            Some(error) => Err(error),
            None => Ok(self.lock().authentication_challenge.clone()),
        }
    }

    async fn login_finish(&self, _response: &AuthenticationResponse) -> Result<SessionPayload> {
        match self.record_then_take(RecordedCall::LoginFinish, Endpoint::LoginFinish) {
            Some(error) => Err(error),
            None => Ok(self.lock().session.clone()),
        }
    }

    async fn recovery_start(&self, email: &str, recaptcha: Option<&RecaptchaToken>) -> Result<()> {
        let call = RecordedCall::RecoveryStart {
            email: email.to_string(),
            recaptcha: recaptcha.cloned(),
        };
        match self.record_then_take(call, Endpoint::RecoveryStart) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn recovery_verify(&self, email: &str, code: &str) -> Result<()> {
        let call = RecordedCall::RecoveryVerify {
            email: email.to_string(),
            code: code.to_string(),
        };
        match self.record_then_take(call, Endpoint::RecoveryVerify) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn recovery_passkey_start(&self) -> Result<RegistrationChallenge> {
        match self
            .record_then_take(RecordedCall::RecoveryPasskeyStart, Endpoint::RecoveryPasskeyStart)
        {
            Some(error) => Err(error),
            None => Ok(self.lock().registration_challenge.clone()),
        }
    }

    async fn recovery_passkey_finish(
        &self,
        _response: &RegistrationResponse,
    ) -> Result<SessionPayload> {
        match self.record_then_take(
            RecordedCall::RecoveryPasskeyFinish,
            Endpoint::RecoveryPasskeyFinish,
        ) {
            Some(error) => Err(error),
            None => Ok(self.lock().session.clone()),
        }
    }

    async fn resend_otp(&self, email: &str) -> Result<()> {
        let call = RecordedCall::ResendOtp {
            email: email.to_string(),
        };
        match self.record_then_take(call, Endpoint::ResendOtp) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn cancel_pending_flow(&self, email: &str) -> Result<()> {
        let call = RecordedCall::CancelPendingFlow {
            email: email.to_string(),
        };
        match self.record_then_take(call, Endpoint::CancelPendingFlow) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn default_registration_challenge() -> RegistrationChallenge {
    RegistrationChallenge {
        challenge: Some(codec::encode(b"mock-registration-challenge")),
        rp: Some(RelyingParty {
            id: Some("divvy.test".to_string()),
            name: Some("Divvy".to_string()),
        }),
        user: Some(ChallengeUser {
            id: Some(codec::encode(b"mock-user-handle")),
            name: Some("ada@divvy.test".to_string()),
            display_name: Some("Ada".to_string()),
        }),
        exclude_credentials: None,
        timeout: Some(60_000),
    }
}

fn default_authentication_challenge() -> AuthenticationChallenge {
    AuthenticationChallenge {
        challenge: Some(codec::encode(b"mock-authentication-challenge")),
        rp_id: Some("divvy.test".to_string()),
        allow_credentials: None,
        timeout: Some(60_000),
        user_verification: Some("required".to_string()),
    }
}

fn default_session() -> SessionPayload {
    SessionPayload {
        token: "mock-bearer-token".to_string(),
        user: User {
            id: UserId::new(),
            email: "ada@divvy.test".to_string(),
            name: Some("Ada".to_string()),
        },
    }
}
