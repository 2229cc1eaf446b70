//! # Divvy Testing
//!
//! Testing utilities and helpers for the Divvy client architecture.
//!
//! This crate provides:
//! - Deterministic mock implementations of Environment traits
//! - A fluent Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use divvy_testing::ReducerTest;
//! use divvy_testing::assertions;
//!
//! ReducerTest::new(OtpReducer::new())
//!     .with_env(test_environment())
//!     .given_state(AuthState::default())
//!     .when_action(AuthAction::OtpTick)
//!     .then_state(|state| {
//!         assert!(state.otp.is_none());
//!     })
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use divvy_core::environment::Clock;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use divvy_testing::mocks::FixedClock;
    /// use divvy_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
