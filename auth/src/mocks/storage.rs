//! In-memory storage for testing.

use crate::error::{AuthError, Result};
use crate::providers::storage::TokenStorage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryStorageInner {
    map: HashMap<String, String>,
    fail_next_put: Option<AuthError>,
}

/// [`TokenStorage`] held entirely in memory.
///
/// Clones share the same map, so a handle and a test can both see writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write fail with `error`.
    pub fn fail_next_put(&self, error: AuthError) {
        self.lock().fail_next_put = Some(error);
    }

    /// Snapshot of everything currently stored.
    #[must_use]
    pub fn contents(&self) -> HashMap<String, String> {
        self.lock().map.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStorageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().map.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        if let Some(error) = inner.fail_next_put.take() {
            return Err(error);
        }
        inner.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock().map.remove(key);
        Ok(())
    }
}
