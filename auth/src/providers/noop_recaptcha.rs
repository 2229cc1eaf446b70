//! Bot-detection provider that reports nothing.
//!
//! For development builds and hosts that run without a bot-detection
//! surface. Every assessment yields no token, so the backend sees the
//! same shape as an unconfigured provider and applies its own policy.

use super::recaptcha::RecaptchaClient;
use crate::error::Result;

/// A [`RecaptchaClient`] with no provider behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecaptchaClient;

impl NoopRecaptchaClient {
    /// Create a no-op client.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RecaptchaClient for NoopRecaptchaClient {
    async fn execute(&self, action: &str) -> Result<Option<String>> {
        tracing::debug!(action = %action, "No bot-detection provider configured, proceeding without token");
        Ok(None)
    }

    async fn reset(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn yields_no_token_for_any_action() {
        let client = NoopRecaptchaClient::new();
        let token = client.execute("recovery_start").await;
        assert_eq!(token, Ok(None));
    }
}
