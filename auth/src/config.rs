//! Configuration for authentication flows.
//!
//! All timing and endpoint parameters live here so hosts can tune them
//! without touching flow logic. Defaults match the production backend's
//! contract; tests shrink the timings instead of waiting out real clocks.

use std::path::PathBuf;
use std::time::Duration;

/// One-time-passcode timing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpConfig {
    /// Seconds a freshly issued code stays valid.
    pub ttl_seconds: u32,

    /// Seconds the resend control stays locked after a send.
    pub resend_cooldown_seconds: u32,

    /// Quiet period between the final digit and automatic submission.
    pub auto_submit_debounce: Duration,
}

impl OtpConfig {
    /// Create a configuration with production timings.
    ///
    /// # Example
    ///
    /// ```
    /// use divvy_auth::config::OtpConfig;
    ///
    /// let config = OtpConfig::new();
    /// assert_eq!(config.ttl_seconds, 300);
    /// assert_eq!(config.resend_cooldown_seconds, 60);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ttl_seconds: 300,
            resend_cooldown_seconds: 60,
            auto_submit_debounce: Duration::from_millis(300),
        }
    }

    /// Set the code lifetime in seconds.
    #[must_use]
    pub const fn with_ttl_seconds(mut self, seconds: u32) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Set the resend cooldown in seconds.
    #[must_use]
    pub const fn with_resend_cooldown_seconds(mut self, seconds: u32) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    /// Set the auto-submit quiet period.
    #[must_use]
    pub const fn with_auto_submit_debounce(mut self, debounce: Duration) -> Self {
        self.auto_submit_debounce = debounce;
        self
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Bot-detection provider parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecaptchaConfig {
    /// Action label reported with the invisible assessment when recovery
    /// starts. The backend scores per action.
    pub recovery_action: String,
}

impl RecaptchaConfig {
    /// Create a configuration with the production action label.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recovery_action: "recovery_start".to_string(),
        }
    }

    /// Set the action label for recovery assessments.
    #[must_use]
    pub fn with_recovery_action(mut self, action: impl Into<String>) -> Self {
        self.recovery_action = action.into();
        self
    }
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend endpoint parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL all auth routes are resolved against.
    pub base_url: String,
}

impl ApiConfig {
    /// Create a configuration pointed at the given backend.
    ///
    /// # Example
    ///
    /// ```
    /// use divvy_auth::config::ApiConfig;
    ///
    /// let config = ApiConfig::new("http://localhost:8787/v1");
    /// assert_eq!(config.base_url, "http://localhost:8787/v1");
    /// ```
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("https://api.divvy.app/v1")
    }
}

/// Durable session storage parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Application name used to derive the platform data directory.
    pub app_name: String,

    /// Explicit storage file path. When set, `app_name` is ignored.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Create a configuration storing under the platform data directory
    /// for `app_name`.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            path: None,
        }
    }

    /// Store at an explicit file path instead of the derived location.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new("divvy")
    }
}

/// Aggregate configuration for the auth orchestrator.
///
/// # Example
///
/// ```
/// use divvy_auth::config::{ApiConfig, AuthConfig, OtpConfig};
///
/// let config = AuthConfig::new()
///     .with_api(ApiConfig::new("http://localhost:8787/v1"))
///     .with_otp(OtpConfig::new().with_ttl_seconds(10));
///
/// assert_eq!(config.otp.ttl_seconds, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    /// Backend endpoints.
    pub api: ApiConfig,

    /// One-time-passcode timings.
    pub otp: OtpConfig,

    /// Bot-detection parameters.
    pub recaptcha: RecaptchaConfig,

    /// Session persistence parameters.
    pub storage: StorageConfig,
}

impl AuthConfig {
    /// Create a configuration with production defaults throughout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend endpoint configuration.
    #[must_use]
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Set the one-time-passcode timings.
    #[must_use]
    pub fn with_otp(mut self, otp: OtpConfig) -> Self {
        self.otp = otp;
        self
    }

    /// Set the bot-detection parameters.
    #[must_use]
    pub fn with_recaptcha(mut self, recaptcha: RecaptchaConfig) -> Self {
        self.recaptcha = recaptcha;
        self
    }

    /// Set the session persistence parameters.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }
}
