//! Bot-detection provider abstraction.
//!
//! Wraps whatever assessment surface the host embeds. The orchestrator
//! only needs two things from it: mint an invisible token for an action,
//! and reset the interactive widget after a token is consumed.

use crate::error::Result;
use std::future::Future;

/// Bot-detection assessment surface.
pub trait RecaptchaClient: Send + Sync {
    /// Run an invisible assessment labelled `action`.
    ///
    /// Returns `Ok(None)` when the provider is not configured or not yet
    /// loaded; flows proceed without a token and let the backend decide
    /// whether to escalate.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AuthError::Network`] when the provider is
    /// present but the assessment itself fails.
    fn execute(&self, action: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Reset the interactive widget so the next solve mints a fresh token.
    ///
    /// Called after a widget token is consumed and when the flow resets.
    /// Must be harmless when no widget is showing.
    fn reset(&self) -> impl Future<Output = ()> + Send;
}
