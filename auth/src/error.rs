//! Error types for authentication flows.
//!
//! This is the closed error taxonomy of the auth orchestrator. Errors are
//! `Clone + PartialEq` because they live in flow state and travel inside
//! actions, and the classification helpers drive the orchestrator's recovery
//! policy: retry in place, force a state transition, or surface a terminal
//! message for the current attempt.

use crate::codec::CodecError;
use crate::constants::error_codes;
use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the authentication orchestrator.
///
/// Every failure a flow can hit maps onto exactly one of these variants,
/// organized by where the failure originated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Credential Ceremony Errors
    // ═══════════════════════════════════════════════════════════

    /// The server sent a challenge the ceremony adapter cannot use.
    ///
    /// Fatal to the current step; retrying without restarting the flow
    /// fails the same way.
    #[error("Malformed credential challenge: {reason}")]
    MalformedChallenge {
        /// What was missing or undecodable
        reason: String,
    },

    /// The platform has no credential API support.
    #[error("Credential ceremonies are not supported on this platform")]
    CeremonyUnsupported,

    /// The user dismissed the platform credential dialog.
    #[error("Credential ceremony was cancelled")]
    CeremonyCancelled,

    /// The platform credential dialog timed out waiting for the user.
    #[error("Credential ceremony timed out")]
    CeremonyTimedOut,

    /// A credential for this account already exists on the authenticator.
    #[error("A passkey is already registered on this device")]
    CeremonyAlreadyRegistered,

    /// Insecure context or relying-party mismatch.
    #[error("Credential ceremony security error: {message}")]
    CeremonySecurity {
        /// Platform-supplied description
        message: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Backend Account Errors
    // ═══════════════════════════════════════════════════════════

    /// The account never completed signup server-side.
    ///
    /// The only cross-flow redirect in the taxonomy: it forces the flow
    /// back to the signup email step.
    #[error("No account exists for this email")]
    UserNotFound,

    /// Wrong or stale input at a verification step.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login was attempted against an unverified account.
    ///
    /// Triggers the login-to-verification side channel with the attached
    /// email carried forward.
    #[error("Email verification required")]
    VerificationRequired {
        /// Email to verify, as attached by the backend. May be empty when
        /// the backend omits it; callers fall back to the flow's own email.
        email: String,
    },

    /// The backend rejected the low-friction bot-detection token.
    ///
    /// Never shown as an error message; surfaces as the interactive widget.
    #[error("Interactive bot-detection challenge required")]
    RecaptchaRequired,

    /// Any other backend error, kept with its stable code.
    #[error("Backend error {code}: {message}")]
    Api {
        /// Stable short code
        code: String,
        /// Human-readable message, for display only
        message: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Local Errors
    // ═══════════════════════════════════════════════════════════

    /// Transport failure or an unclassifiable response.
    #[error("Network error: {message}")]
    Network {
        /// What failed
        message: String,
    },

    /// Wire payload transcoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Durable session storage failed.
    #[error("Session storage error: {message}")]
    Storage {
        /// What failed
        message: String,
    },
}

impl AuthError {
    /// Map a backend error envelope to the taxonomy.
    ///
    /// Dispatches on the stable code, never on the message text.
    /// Unrecognized codes land in [`AuthError::Api`] with code and message
    /// preserved.
    ///
    /// # Example
    ///
    /// ```
    /// use divvy_auth::error::AuthError;
    ///
    /// let err = AuthError::from_api("U001", "user not found".to_string(), None);
    /// assert_eq!(err, AuthError::UserNotFound);
    ///
    /// let err = AuthError::from_api("W017", "attestation rejected".to_string(), None);
    /// assert!(matches!(err, AuthError::Api { .. }));
    /// ```
    #[must_use]
    pub fn from_api(code: &str, message: String, email: Option<String>) -> Self {
        match code {
            error_codes::USER_NOT_FOUND => Self::UserNotFound,
            error_codes::INVALID_CREDENTIALS => Self::InvalidCredentials,
            error_codes::VERIFICATION_REQUIRED => Self::VerificationRequired {
                email: email.unwrap_or_default(),
            },
            error_codes::RECAPTCHA_ESCALATION => Self::RecaptchaRequired,
            _ => Self::Api {
                code: code.to_string(),
                message,
            },
        }
    }

    /// Whether the backend demands an interactive bot-detection challenge.
    #[must_use]
    pub const fn is_escalation(&self) -> bool {
        matches!(self, Self::RecaptchaRequired)
    }

    /// Whether the user may simply re-invoke the same step.
    ///
    /// Ceremony dismissals, wrong input, and transport hiccups are recovered
    /// locally; the flow stays where it is.
    ///
    /// # Example
    ///
    /// ```
    /// use divvy_auth::error::AuthError;
    ///
    /// assert!(AuthError::CeremonyCancelled.retryable_in_place());
    /// assert!(AuthError::CeremonyTimedOut.retryable_in_place());
    /// assert!(!AuthError::CeremonyUnsupported.retryable_in_place());
    /// ```
    #[must_use]
    pub const fn retryable_in_place(&self) -> bool {
        matches!(
            self,
            Self::CeremonyCancelled
                | Self::CeremonyTimedOut
                | Self::InvalidCredentials
                | Self::Network { .. }
        )
    }

    /// Whether the flow is impossible in its current shape and must move
    /// to a different state.
    #[must_use]
    pub const fn forces_transition(&self) -> bool {
        matches!(self, Self::UserNotFound | Self::CeremonyUnsupported)
    }
}
