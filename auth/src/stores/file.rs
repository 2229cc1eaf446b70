//! File-backed session storage.
//!
//! All keys live in one JSON document under the platform data directory,
//! such as `~/.local/share/divvy/auth.json` on Linux. Writes go through a
//! temporary file and an atomic rename so a crash mid-write leaves the
//! previous document intact, and a mutex serializes read-modify-write
//! cycles against concurrent writers in the same process.

use crate::config::StorageConfig;
use crate::error::{AuthError, Result};
use crate::providers::storage::TokenStorage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// [`TokenStorage`] backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStorage {
    /// Create storage at the configured location.
    ///
    /// Without an explicit path, the file lives under the platform data
    /// directory for the configured application name. Nothing is touched
    /// on disk until the first write.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when no platform data directory
    /// exists and no explicit path was configured.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .ok_or_else(|| AuthError::Storage {
                    message: "no platform data directory available".to_string(),
                })?
                .join(&config.app_name)
                .join("auth.json"),
        };
        Ok(Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Where the document lives.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_document(&self) -> Result<HashMap<String, String>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(AuthError::Storage {
                    message: format!("reading {}: {e}", self.path.display()),
                });
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(map) => Ok(map),
            Err(e) => {
                // A corrupt document must not brick authentication; the
                // next write replaces it wholesale
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Session storage document is corrupt, treating as empty"
                );
                Ok(HashMap::new())
            }
        }
    }

    async fn write_document(&self, document: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Storage {
                    message: format!("creating {}: {e}", parent.display()),
                })?;
        }

        let bytes = serde_json::to_vec_pretty(document).map_err(|e| AuthError::Storage {
            message: e.to_string(),
        })?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| AuthError::Storage {
                message: format!("writing {}: {e}", tmp.display()),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AuthError::Storage {
                message: format!("replacing {}: {e}", self.path.display()),
            })
    }
}

impl TokenStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_document().await?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value.to_string());
        self.write_document(&document).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        if document.remove(key).is_none() {
            return Ok(());
        }
        self.write_document(&document).await
    }
}
