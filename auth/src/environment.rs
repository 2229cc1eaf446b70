//! Environment for authentication reducers.
//!
//! All side effects the flows perform go through the providers bundled
//! here. Reducers stay pure; their effects clone what they need out of
//! the environment and run it on the store's runtime. Swapping any
//! provider for a mock turns the whole orchestrator deterministic.

use crate::providers::api::AuthApi;
use crate::providers::ceremony::CredentialApi;
use crate::providers::recaptcha::RecaptchaClient;
use crate::providers::storage::TokenStorage;
use crate::session::SessionHandle;
use divvy_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Dependency bundle for the authentication reducers.
#[derive(Clone)]
pub struct AuthEnvironment<A, C, R, S>
where
    A: AuthApi,
    C: CredentialApi,
    R: RecaptchaClient,
    S: TokenStorage,
{
    /// Backend API client.
    pub api: A,

    /// Platform credential surface.
    pub credentials: C,

    /// Bot-detection provider.
    pub recaptcha: R,

    /// Durable session handle, shared with the host's transport layer.
    pub session: SessionHandle<S>,

    /// Time source, swappable for tests.
    pub clock: Arc<dyn Clock>,
}

impl<A, C, R, S> AuthEnvironment<A, C, R, S>
where
    A: AuthApi,
    C: CredentialApi,
    R: RecaptchaClient,
    S: TokenStorage,
{
    /// Bundle providers with the system clock.
    pub fn new(api: A, credentials: C, recaptcha: R, session: SessionHandle<S>) -> Self {
        Self {
            api,
            credentials,
            recaptcha,
            session,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
