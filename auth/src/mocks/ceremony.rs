//! Mock platform credential surface for testing.

use crate::providers::ceremony::{
    AssertedCredential, CreatedCredential, CreationOptions, CredentialApi, PlatformError,
    RequestOptions,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct MockCredentialApiInner {
    supported: bool,
    creation_requests: Vec<CreationOptions>,
    assertion_requests: Vec<RequestOptions>,
    fail_create: Option<PlatformError>,
    fail_get: Option<PlatformError>,
}

/// Mock [`CredentialApi`] that completes every ceremony instantly.
///
/// Ceremonies succeed with deterministic credentials unless a one-shot
/// failure is injected. The options each ceremony received are recorded
/// for inspection.
#[derive(Debug, Clone)]
pub struct MockCredentialApi {
    inner: Arc<Mutex<MockCredentialApiInner>>,
}

impl MockCredentialApi {
    /// Create a supported platform surface.
    #[must_use]
    pub fn new() -> Self {
        Self::with_support(true)
    }

    /// Create a platform surface with no credential API, the way an old
    /// browser or a non-secure context looks.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::with_support(false)
    }

    fn with_support(supported: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockCredentialApiInner {
                supported,
                creation_requests: Vec::new(),
                assertion_requests: Vec::new(),
                fail_create: None,
                fail_get: None,
            })),
        }
    }

    /// Make the next creation ceremony fail with `error`.
    pub fn fail_create(&self, error: PlatformError) {
        self.lock().fail_create = Some(error);
    }

    /// Make the next assertion ceremony fail with `error`.
    pub fn fail_get(&self, error: PlatformError) {
        self.lock().fail_get = Some(error);
    }

    /// Options every creation ceremony received, in order.
    #[must_use]
    pub fn creation_requests(&self) -> Vec<CreationOptions> {
        self.lock().creation_requests.clone()
    }

    /// Options every assertion ceremony received, in order.
    #[must_use]
    pub fn assertion_requests(&self) -> Vec<RequestOptions> {
        self.lock().assertion_requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockCredentialApiInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockCredentialApi {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialApi for MockCredentialApi {
    fn is_supported(&self) -> bool {
        self.lock().supported
    }

    async fn create(&self, options: CreationOptions) -> Result<CreatedCredential, PlatformError> {
        let mut inner = self.lock();
        inner.creation_requests.push(options);
        if let Some(error) = inner.fail_create.take() {
            return Err(error);
        }
        Ok(CreatedCredential {
            id: "mock-credential".to_string(),
            raw_id: b"mock-credential-raw".to_vec(),
            client_data_json: br#"{"type":"webauthn.create"}"#.to_vec(),
            attestation_object: b"mock-attestation-object".to_vec(),
            extensions: serde_json::json!({}),
        })
    }

    async fn get(&self, options: RequestOptions) -> Result<AssertedCredential, PlatformError> {
        let mut inner = self.lock();
        inner.assertion_requests.push(options);
        if let Some(error) = inner.fail_get.take() {
            return Err(error);
        }
        Ok(AssertedCredential {
            id: "mock-credential".to_string(),
            raw_id: b"mock-credential-raw".to_vec(),
            client_data_json: br#"{"type":"webauthn.get"}"#.to_vec(),
            authenticator_data: b"mock-authenticator-data".to_vec(),
            signature: b"mock-signature".to_vec(),
            user_handle: Some(b"mock-user-handle".to_vec()),
            extensions: serde_json::json!({}),
        })
    }
}
