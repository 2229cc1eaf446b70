//! Dependency injection traits
//!
//! All external dependencies are abstracted behind traits and injected
//! via the Environment parameter of a reducer.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// Production code uses [`SystemClock`]; tests inject a fixed clock so
/// time-dependent logic stays deterministic.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// System clock backed by the OS
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
