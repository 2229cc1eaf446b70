//! Platform credential API abstraction.
//!
//! The ceremony adapter in [`crate::passkeys`] is written against this trait
//! so flow logic never touches a platform credential surface directly. A
//! host wires in whatever the platform offers; tests wire in
//! [`crate::mocks::MockCredentialApi`].

use serde_json::Value;
use std::future::Future;
use thiserror::Error;

/// Raw failure reported by a platform credential API.
///
/// These mirror the handful of failure classes every credential surface
/// exposes. The adapter folds them into [`crate::error::AuthError`] with
/// ceremony context applied; nothing outside the adapter matches on them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// No credential API exists on this platform.
    #[error("Credential API is not available")]
    NotSupported,

    /// The ceremony ended without a credential. Dismissal, timeout, and
    /// platform veto all land here; `message` is the only discriminator
    /// the platform provides.
    #[error("Ceremony not allowed: {message}")]
    NotAllowed {
        /// Platform-supplied description
        message: String,
    },

    /// The authenticator's state conflicts with the request, such as an
    /// excluded credential already being present.
    #[error("Authenticator state conflict")]
    InvalidState,

    /// Insecure context or relying-party mismatch.
    #[error("Security failure: {message}")]
    Security {
        /// Platform-supplied description
        message: String,
    },

    /// Anything the platform reports outside the classes above.
    #[error("{0}")]
    Other(String),
}

/// Reference to an existing credential, for exclusion or allow lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRef {
    /// Raw credential id.
    pub id: Vec<u8>,

    /// Transport hints, such as `"internal"` or `"hybrid"`.
    pub transports: Vec<String>,
}

/// Decoded options for a credential creation ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationOptions {
    /// Raw challenge bytes to be signed.
    pub challenge: Vec<u8>,

    /// Relying party identifier.
    pub rp_id: String,

    /// Human-readable relying party name.
    pub rp_name: String,

    /// Raw user handle bytes.
    pub user_id: Vec<u8>,

    /// Account name shown in the platform dialog.
    pub user_name: String,

    /// Display name shown in the platform dialog.
    pub user_display_name: String,

    /// Credentials the authenticator must not duplicate.
    pub exclude_credentials: Vec<CredentialRef>,

    /// Ceremony timeout in milliseconds, if the server set one.
    pub timeout_ms: Option<u64>,
}

/// Decoded options for a credential assertion ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Raw challenge bytes to be signed.
    pub challenge: Vec<u8>,

    /// Relying party identifier, if the server pinned one.
    pub rp_id: Option<String>,

    /// Credentials the platform may satisfy the request with. Empty means
    /// discoverable: the platform offers whatever it has.
    pub allow_credentials: Vec<CredentialRef>,

    /// Ceremony timeout in milliseconds, if the server set one.
    pub timeout_ms: Option<u64>,

    /// User verification requirement, such as `"required"`.
    pub user_verification: Option<String>,
}

/// A credential produced by a creation ceremony, fields still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedCredential {
    /// Credential id as the platform reports it.
    pub id: String,

    /// Raw credential id bytes.
    pub raw_id: Vec<u8>,

    /// Serialized client data.
    pub client_data_json: Vec<u8>,

    /// Attestation object bytes.
    pub attestation_object: Vec<u8>,

    /// Client extension results, passed through untouched.
    pub extensions: Value,
}

/// An assertion produced by a get ceremony, fields still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertedCredential {
    /// Credential id as the platform reports it.
    pub id: String,

    /// Raw credential id bytes.
    pub raw_id: Vec<u8>,

    /// Serialized client data.
    pub client_data_json: Vec<u8>,

    /// Authenticator data bytes.
    pub authenticator_data: Vec<u8>,

    /// Assertion signature bytes.
    pub signature: Vec<u8>,

    /// Raw user handle, when the authenticator discloses one.
    pub user_handle: Option<Vec<u8>>,

    /// Client extension results, passed through untouched.
    pub extensions: Value,
}

/// Platform credential surface.
pub trait CredentialApi: Send + Sync {
    /// Whether this platform can run credential ceremonies at all.
    ///
    /// Checked before every ceremony; flows route to an unsupported state
    /// instead of calling [`CredentialApi::create`] when this is false.
    fn is_supported(&self) -> bool;

    /// Run a credential creation ceremony.
    ///
    /// # Errors
    ///
    /// Returns a [`PlatformError`] when the platform refuses or the user
    /// does not complete the dialog.
    fn create(
        &self,
        options: CreationOptions,
    ) -> impl Future<Output = Result<CreatedCredential, PlatformError>> + Send;

    /// Run a credential assertion ceremony.
    ///
    /// # Errors
    ///
    /// Returns a [`PlatformError`] when the platform refuses or the user
    /// does not complete the dialog.
    fn get(
        &self,
        options: RequestOptions,
    ) -> impl Future<Output = Result<AssertedCredential, PlatformError>> + Send;
}
