//! Mock providers for testing authentication flows.
//!
//! Every provider seam has an in-memory double here with failure
//! injection and call recording. [`mock_environment`] bundles them into
//! a ready-to-use [`AuthEnvironment`], and the type aliases name the
//! reducers instantiated over the mock providers so tests stay readable.

pub mod api;
pub mod ceremony;
pub mod recaptcha;
pub mod storage;

pub use api::{Endpoint, MockAuthApi, RecordedCall};
pub use ceremony::MockCredentialApi;
pub use recaptcha::MockRecaptchaClient;
pub use storage::MemoryStorage;

use crate::environment::AuthEnvironment;
use crate::reducers::{FlowReducer, LoginReducer, OtpReducer, RecoveryReducer, SignupReducer};
use crate::session::SessionHandle;

/// Environment assembled from the mock providers.
pub type MockEnvironment =
    AuthEnvironment<MockAuthApi, MockCredentialApi, MockRecaptchaClient, MemoryStorage>;

/// Flow reducer over the mock providers.
pub type MockFlowReducer =
    FlowReducer<MockAuthApi, MockCredentialApi, MockRecaptchaClient, MemoryStorage>;

/// Signup reducer over the mock providers.
pub type MockSignupReducer =
    SignupReducer<MockAuthApi, MockCredentialApi, MockRecaptchaClient, MemoryStorage>;

/// Login reducer over the mock providers.
pub type MockLoginReducer =
    LoginReducer<MockAuthApi, MockCredentialApi, MockRecaptchaClient, MemoryStorage>;

/// Recovery reducer over the mock providers.
pub type MockRecoveryReducer =
    RecoveryReducer<MockAuthApi, MockCredentialApi, MockRecaptchaClient, MemoryStorage>;

/// Verification-step reducer over the mock providers.
pub type MockOtpReducer =
    OtpReducer<MockAuthApi, MockCredentialApi, MockRecaptchaClient, MemoryStorage>;

/// A fresh environment where every backend call succeeds.
#[must_use]
pub fn mock_environment() -> MockEnvironment {
    AuthEnvironment::new(
        MockAuthApi::new(),
        MockCredentialApi::new(),
        MockRecaptchaClient::new(),
        SessionHandle::new(MemoryStorage::new()),
    )
}

/// Like [`mock_environment`], but on a platform with no credential API.
#[must_use]
pub fn mock_environment_without_passkeys() -> MockEnvironment {
    AuthEnvironment::new(
        MockAuthApi::new(),
        MockCredentialApi::unsupported(),
        MockRecaptchaClient::new(),
        SessionHandle::new(MemoryStorage::new()),
    )
}
