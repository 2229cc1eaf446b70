//! Mock bot-detection provider for testing.

use crate::error::{AuthError, Result};
use crate::providers::recaptcha::RecaptchaClient;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct MockRecaptchaClientInner {
    execute_result: Result<Option<String>>,
    executed_actions: Vec<String>,
    reset_count: usize,
}

/// Mock [`RecaptchaClient`] with a configurable assessment outcome.
///
/// Unlike the backend mock, the configured outcome is persistent: every
/// assessment yields the same result until it is reconfigured, matching
/// how a provider behaves within one page load.
#[derive(Debug, Clone)]
pub struct MockRecaptchaClient {
    inner: Arc<Mutex<MockRecaptchaClientInner>>,
}

impl MockRecaptchaClient {
    /// Create a provider whose assessments succeed with a fixed token.
    #[must_use]
    pub fn new() -> Self {
        Self::with_result(Ok(Some("mock-v3-token".to_string())))
    }

    /// Create a provider that is not loaded, yielding no token.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self::with_result(Ok(None))
    }

    fn with_result(execute_result: Result<Option<String>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRecaptchaClientInner {
                execute_result,
                executed_actions: Vec::new(),
                reset_count: 0,
            })),
        }
    }

    /// Make every assessment fail with `error`.
    pub fn set_execute_error(&self, error: AuthError) {
        self.lock().execute_result = Err(error);
    }

    /// Make every assessment succeed with `token`.
    pub fn set_token(&self, token: impl Into<String>) {
        self.lock().execute_result = Ok(Some(token.into()));
    }

    /// Action labels of every assessment run, in order.
    #[must_use]
    pub fn executed_actions(&self) -> Vec<String> {
        self.lock().executed_actions.clone()
    }

    /// How many times the widget was reset.
    #[must_use]
    pub fn reset_count(&self) -> usize {
        self.lock().reset_count
    }

    fn lock(&self) -> MutexGuard<'_, MockRecaptchaClientInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockRecaptchaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecaptchaClient for MockRecaptchaClient {
    async fn execute(&self, action: &str) -> Result<Option<String>> {
        let mut inner = self.lock();
        inner.executed_actions.push(action.to_string());
        inner.execute_result.clone()
    }

    async fn reset(&self) {
        self.lock().reset_count += 1;
    }
}
