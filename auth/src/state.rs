//! Authentication flow state.
//!
//! One [`AuthState`] value is the whole orchestrator: which step the user
//! is on, the data scoped to the active flow, countdowns, escalations, and
//! the signed-in session. Reducers mutate it; nothing else does.

use crate::error::AuthError;
use crate::otp::OtpState;
use crate::passkeys::{AuthenticationChallenge, RegistrationChallenge};
use crate::recaptcha::RecaptchaState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Profile of a signed-in user, as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique account identifier.
    pub id: UserId,

    /// Verified email address.
    pub email: String,

    /// Display name, when the account has one.
    pub name: Option<String>,
}

/// An authenticated session: the bearer token plus who it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for authenticated requests.
    pub token: String,

    /// The signed-in user.
    pub user: User,
}

/// Which flow family the user is moving through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowFamily {
    /// Creating a new account.
    Signup,

    /// Signing in to an existing account.
    Login,

    /// Regaining access after losing every passkey.
    Recovery,
}

impl FlowFamily {
    /// Stable label for logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::Login => "login",
            Self::Recovery => "recovery",
        }
    }
}

/// The step the user is currently on.
///
/// Shared steps carry their flow family so a verification success knows
/// which flow to continue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowState {
    /// No flow active.
    #[default]
    Idle,

    /// Collecting email and name for a new account.
    SignupEmail,

    /// Collecting an optional email to sign in with.
    LoginEmail,

    /// Collecting the email to recover.
    RecoveryEmail,

    /// Waiting for the emailed one-time code.
    Otp {
        /// Flow family the verification belongs to.
        flow: FlowFamily,
    },

    /// Running a credential ceremony.
    Passkey {
        /// Flow family the ceremony belongs to.
        flow: FlowFamily,
    },
}

impl FlowState {
    /// The flow family this step belongs to, if any.
    #[must_use]
    pub const fn family(self) -> Option<FlowFamily> {
        match self {
            Self::Idle => None,
            Self::SignupEmail => Some(FlowFamily::Signup),
            Self::LoginEmail => Some(FlowFamily::Login),
            Self::RecoveryEmail => Some(FlowFamily::Recovery),
            Self::Otp { flow } | Self::Passkey { flow } => Some(flow),
        }
    }
}

/// Challenge options received from the backend, held until the ceremony
/// step consumes them.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChallenge {
    /// Options for a credential creation ceremony.
    Registration(RegistrationChallenge),

    /// Options for a credential assertion ceremony.
    Authentication(AuthenticationChallenge),
}

/// Data scoped to the lifetime of one flow.
///
/// Non-empty only while a flow is active; cleared whenever the step
/// returns to [`FlowState::Idle`] or switches flow family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowData {
    /// Email the flow is operating on.
    pub email: Option<String>,

    /// Name collected during signup.
    pub name: Option<String>,

    /// Challenge waiting for its ceremony.
    pub pending_challenge: Option<PendingChallenge>,
}

impl FlowData {
    /// Drop everything scoped to the flow.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether no flow-scoped data is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.pending_challenge.is_none()
    }
}

/// A non-fatal announcement for the UI, such as a failed resend.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNotice {
    /// What happened, ready for display.
    pub message: String,

    /// When it happened.
    pub at: DateTime<Utc>,
}

/// Complete state of the authentication orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    /// The step the user is on.
    pub step: FlowState,

    /// Data scoped to the active flow.
    pub flow: FlowData,

    /// A backend or ceremony operation is running; entry operations are
    /// ignored while set.
    pub in_flight: bool,

    /// Bot-detection escalation state.
    pub recaptcha: RecaptchaState,

    /// Countdown state, present only on the verification step.
    pub otp: Option<OtpState>,

    /// The signed-in session, if any.
    pub session: Option<Session>,

    /// Error from the most recent failed operation.
    pub last_error: Option<AuthError>,

    /// Most recent non-fatal announcement.
    pub notice: Option<FlowNotice>,

    /// The platform cannot run credential ceremonies.
    pub passkeys_unsupported: bool,
}

impl AuthState {
    /// State restored at startup from whatever session storage held.
    #[must_use]
    pub fn hydrated(session: Option<Session>) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}
