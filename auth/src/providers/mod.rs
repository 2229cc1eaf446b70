//! Provider traits and production implementations.
//!
//! Each seam the orchestrator depends on lives behind a trait here: the
//! backend API, the platform credential surface, the bot-detection
//! provider, and durable storage. Reducers receive them bundled in
//! [`crate::environment::AuthEnvironment`].

pub mod api;
pub mod ceremony;
pub mod http;
pub mod noop_recaptcha;
pub mod recaptcha;
pub mod storage;

pub use api::{ApiErrorBody, AuthApi, SessionPayload};
pub use ceremony::{
    AssertedCredential, CreatedCredential, CreationOptions, CredentialApi, CredentialRef,
    PlatformError, RequestOptions,
};
pub use http::HttpAuthApi;
pub use noop_recaptcha::NoopRecaptchaClient;
pub use recaptcha::RecaptchaClient;
pub use storage::TokenStorage;
