//! Actions driving the authentication orchestrator.
//!
//! Commands are what the UI sends; events are what effects feed back after
//! talking to the backend or the platform. Reducers treat the two halves
//! differently: commands are validated against the current step, events
//! are trusted because only this crate's own effects produce them.

use crate::error::AuthError;
use crate::passkeys::{AuthenticationChallenge, RegistrationChallenge};
use crate::state::{FlowFamily, Session};

/// Every action the authentication store understands.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    // ═══════════════════════════════════════════════════════════
    // Navigation Commands
    // ═══════════════════════════════════════════════════════════
    /// Open the signup flow from the idle state.
    GoToSignup,

    /// Open the login flow from the idle state.
    GoToLogin,

    /// Open the recovery flow from the idle state.
    GoToRecovery,

    /// Abandon the active flow and return to idle.
    ResetFlow,

    // ═══════════════════════════════════════════════════════════
    // Signup Commands
    // ═══════════════════════════════════════════════════════════
    /// Submit the signup form.
    SignupStart {
        /// Email to register.
        email: String,
        /// Display name for the new account.
        name: String,
    },

    /// Submit a signup verification code.
    SignupVerify {
        /// The 6-digit code.
        code: String,
    },

    /// Run the registration ceremony for the pending signup challenge.
    SignupPasskeyFinish,

    // ═══════════════════════════════════════════════════════════
    // Login Commands
    // ═══════════════════════════════════════════════════════════
    /// Begin login. Without an email the backend issues a discoverable
    /// challenge and the platform picks the credential.
    LoginStart {
        /// Email to scope the challenge to, if the user typed one.
        email: Option<String>,
    },

    /// Run the assertion ceremony for the pending login challenge.
    LoginFinish,

    // ═══════════════════════════════════════════════════════════
    // Recovery Commands
    // ═══════════════════════════════════════════════════════════
    /// Submit the recovery form.
    RecoveryStart {
        /// Email of the account to recover.
        email: String,
    },

    /// Submit a recovery verification code.
    RecoveryVerify {
        /// The 6-digit code.
        code: String,
    },

    /// Run the registration ceremony for the pending recovery challenge.
    RecoveryPasskeyFinish,

    // ═══════════════════════════════════════════════════════════
    // Session Commands
    // ═══════════════════════════════════════════════════════════
    /// Sign out and clear durable session storage.
    Logout,

    /// The transport layer saw an authentication rejection for `token`.
    /// Clears the session only if that token is still the current one.
    SessionInvalidated {
        /// Bearer token the rejection was observed for.
        token: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Verification Step Commands
    // ═══════════════════════════════════════════════════════════
    /// The code input field changed.
    OtpInputChanged {
        /// Raw field contents, not yet normalized.
        raw: String,
    },

    /// The user asked for a replacement code.
    OtpResendRequested,

    /// One second elapsed on the verification step.
    OtpTick,

    /// The auto-submit quiet period elapsed with a complete code.
    OtpAutoSubmit {
        /// The code as it was when the quiet period started.
        code: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Bot-Detection Commands
    // ═══════════════════════════════════════════════════════════
    /// The user solved the interactive widget.
    RecaptchaSolved {
        /// Widget token, single-use.
        token: String,
    },

    /// The provider expired the solved widget.
    RecaptchaExpired,

    // ═══════════════════════════════════════════════════════════
    // Backend Events
    // ═══════════════════════════════════════════════════════════
    /// Signup was accepted and a code is on its way.
    SignupStarted {
        /// Email the flow is registering.
        email: String,
        /// Name the flow is registering.
        name: String,
    },

    /// Signup was rejected.
    SignupStartFailed {
        /// What went wrong.
        error: AuthError,
    },

    /// A verification code was accepted; the backend issued a
    /// registration challenge for the next step.
    OtpVerified {
        /// Flow family the verification belonged to.
        flow: FlowFamily,
        /// Challenge for the upcoming creation ceremony.
        challenge: RegistrationChallenge,
    },

    /// A verification code was rejected.
    OtpVerifyFailed {
        /// Flow family the verification belonged to.
        flow: FlowFamily,
        /// What went wrong.
        error: AuthError,
    },

    /// Login was accepted; the backend issued an assertion challenge.
    LoginStarted {
        /// Email the challenge is scoped to, if one was sent.
        email: Option<String>,
        /// Challenge for the upcoming assertion ceremony.
        challenge: AuthenticationChallenge,
    },

    /// Login was rejected.
    LoginStartFailed {
        /// What went wrong.
        error: AuthError,
    },

    /// Recovery was accepted and a code is on its way.
    RecoveryStarted {
        /// Email being recovered.
        email: String,
    },

    /// Recovery was rejected.
    RecoveryStartFailed {
        /// What went wrong.
        error: AuthError,
    },

    /// A ceremony or its backend finish call failed.
    PasskeyStepFailed {
        /// What went wrong.
        error: AuthError,
    },

    /// A flow reached its end: the backend accepted the ceremony response
    /// and returned a session.
    AuthCompleted {
        /// Flow family that completed.
        flow: FlowFamily,
        /// The newly established session.
        session: Session,
    },

    /// A resend request failed; the verification step carries on.
    OtpResendFailed {
        /// What went wrong.
        error: AuthError,
    },

    /// The session was established but writing it to storage failed.
    SessionPersistFailed {
        /// What went wrong.
        error: AuthError,
    },
}
