//! Bot-detection token bookkeeping.
//!
//! Recovery requests carry a bot-detection assessment. The default path is
//! invisible scoring; when the backend rejects the score it escalates to an
//! interactive widget, and the widget's token is single-use. This module
//! owns that escalation state; talking to the actual provider happens behind
//! [`crate::providers::RecaptchaClient`].

use serde::{Deserialize, Serialize};

/// Which assessment produced a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecaptchaVersion {
    /// Interactive widget challenge.
    #[serde(rename = "v2")]
    V2,

    /// Invisible score-based assessment.
    #[serde(rename = "v3")]
    V3,
}

/// A bot-detection token ready to attach to a backend request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecaptchaToken {
    /// Opaque provider token.
    pub token: String,

    /// Which assessment produced it.
    pub version: RecaptchaVersion,
}

impl RecaptchaToken {
    /// Token from an invisible assessment.
    #[must_use]
    pub fn v3(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            version: RecaptchaVersion::V3,
        }
    }

    /// Token from an interactive widget solve.
    #[must_use]
    pub fn v2(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            version: RecaptchaVersion::V2,
        }
    }
}

/// Escalation state for the interactive widget.
///
/// `required` stays set from the first backend rejection until the flow
/// resets, so every retry after an escalation goes through the widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecaptchaState {
    /// The backend has demanded an interactive challenge.
    pub required: bool,

    /// Unconsumed widget token, if the user has solved the challenge.
    pub token: Option<String>,
}

impl RecaptchaState {
    /// Record a backend demand for the interactive widget.
    ///
    /// Drops any stale token; a token minted before the escalation cannot
    /// satisfy it.
    pub fn escalate(&mut self) {
        self.required = true;
        self.token = None;
    }

    /// Record a widget solve.
    pub fn solve(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Record that the provider expired the solved widget.
    ///
    /// The requirement stands; only the token is gone.
    pub fn expire(&mut self) {
        self.token = None;
    }

    /// Clear both the requirement and any token.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Consume the widget token, if the widget is both demanded and solved.
    ///
    /// Returns `None` when no escalation is active, even if a token is
    /// somehow present. The token is removed on success; widget tokens are
    /// single-use and a second submission needs a fresh solve.
    pub fn take_escalated(&mut self) -> Option<RecaptchaToken> {
        if !self.required {
            return None;
        }
        self.token.take().map(RecaptchaToken::v2)
    }
}
