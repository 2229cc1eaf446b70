//! One-time-passcode lifecycle.
//!
//! Pure countdown and input bookkeeping for the verification step. Nothing
//! here talks to the network or schedules timers; the reducer layer drives
//! [`OtpState::tick`] once a second and reacts to what these methods report.

use crate::config::OtpConfig;

/// Number of digits in a complete code.
pub const OTP_LEN: usize = 6;

/// Seconds a freshly issued code stays valid.
pub const OTP_TTL_SECONDS: u32 = 300;

/// Seconds the resend control stays locked after a send.
pub const RESEND_COOLDOWN_SECONDS: u32 = 60;

/// Milliseconds of quiet time before a complete code auto-submits.
pub const AUTO_SUBMIT_DEBOUNCE_MS: u64 = 300;

/// Countdown and input state for an active verification step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpState {
    /// Seconds until the current code expires.
    pub expiry_seconds: u32,

    /// Seconds until the resend control unlocks.
    pub resend_cooldown_seconds: u32,

    /// Normalized digits typed so far, at most [`OTP_LEN`] of them.
    pub input: String,
}

impl OtpState {
    /// State for a freshly entered verification step.
    ///
    /// The expiry clock starts full and the resend control starts unlocked,
    /// because entering the step is itself what sent the first code.
    #[must_use]
    pub fn start(config: &OtpConfig) -> Self {
        Self {
            expiry_seconds: config.ttl_seconds,
            resend_cooldown_seconds: 0,
            input: String::new(),
        }
    }

    /// Advance both countdowns by one second.
    ///
    /// Saturates at zero; ticking an expired state is a no-op, so a timer
    /// that outlives the countdown does no harm.
    pub fn tick(&mut self) {
        self.expiry_seconds = self.expiry_seconds.saturating_sub(1);
        self.resend_cooldown_seconds = self.resend_cooldown_seconds.saturating_sub(1);
    }

    /// Whether the current code can no longer be submitted.
    #[must_use]
    pub const fn expired(&self) -> bool {
        self.expiry_seconds == 0
    }

    /// Whether the resend control is unlocked.
    #[must_use]
    pub const fn can_resend(&self) -> bool {
        self.resend_cooldown_seconds == 0
    }

    /// Record that a replacement code was sent.
    ///
    /// Restarts the expiry clock and locks the resend control for the
    /// configured cooldown. Typed input is kept; the backend accepts the
    /// latest code only, so stale digits simply fail verification.
    pub fn mark_resent(&mut self, config: &OtpConfig) {
        self.expiry_seconds = config.ttl_seconds;
        self.resend_cooldown_seconds = config.resend_cooldown_seconds;
    }
}

/// Normalize raw field input to at most [`OTP_LEN`] digits.
///
/// Strips everything that is not an ASCII digit, which makes pasting
/// "123 456" or "123-456" land as "123456".
///
/// # Example
///
/// ```
/// use divvy_auth::otp::normalize_input;
///
/// assert_eq!(normalize_input("123 456"), "123456");
/// assert_eq!(normalize_input("12a34b5678"), "123456");
/// ```
#[must_use]
pub fn normalize_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(OTP_LEN)
        .collect()
}

/// Whether a normalized input is a complete, submittable code.
#[must_use]
pub fn is_complete(digits: &str) -> bool {
    digits.len() == OTP_LEN && digits.chars().all(|c| c.is_ascii_digit())
}
