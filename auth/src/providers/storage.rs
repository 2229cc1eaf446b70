//! Durable key-value storage abstraction for session material.
//!
//! The session layer persists two small strings, so the surface is a
//! minimal async key-value store. [`crate::stores::FileStorage`] is the
//! production implementation; [`crate::mocks::MemoryStorage`] backs tests.

use crate::error::Result;
use std::future::Future;

/// Durable string storage.
pub trait TokenStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AuthError::Storage`] when the backing
    /// store cannot be read.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AuthError::Storage`] when the backing
    /// store cannot be written.
    fn put(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AuthError::Storage`] when the backing
    /// store cannot be written.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
