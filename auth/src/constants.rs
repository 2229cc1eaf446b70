//! Protocol constants shared across the auth crate.

/// Stable backend error codes.
///
/// The backend attaches one of these short codes to every error envelope.
/// Flow control dispatches on the code, never on the message text, so the
/// backend can reword messages freely.
pub mod error_codes {
    /// No account exists for the supplied email.
    pub const USER_NOT_FOUND: &str = "U001";

    /// Wrong or stale input at a verification step.
    pub const INVALID_CREDENTIALS: &str = "U003";

    /// Login attempted against an account that never finished verification.
    pub const VERIFICATION_REQUIRED: &str = "U004";

    /// The low-friction bot-detection token was rejected; an interactive
    /// challenge is required.
    pub const RECAPTCHA_ESCALATION: &str = "R001";
}

/// Keys under which session material is persisted.
pub mod storage_keys {
    /// Bearer token for authenticated requests.
    pub const BEARER_TOKEN: &str = "auth.token";

    /// Serialized profile of the signed-in user.
    pub const USER: &str = "auth.user";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        // These are wire values; changing them breaks backend compatibility
        assert_eq!(error_codes::USER_NOT_FOUND, "U001");
        assert_eq!(error_codes::INVALID_CREDENTIALS, "U003");
        assert_eq!(error_codes::VERIFICATION_REQUIRED, "U004");
        assert_eq!(error_codes::RECAPTCHA_ESCALATION, "R001");
    }

    #[test]
    fn storage_keys_are_distinct() {
        assert_ne!(storage_keys::BEARER_TOKEN, storage_keys::USER);
    }
}
