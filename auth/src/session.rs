//! Durable session handling.
//!
//! [`SessionHandle`] pairs a [`TokenStorage`] with an in-memory snapshot
//! of the signed-in session. The snapshot is what synchronous callers
//! read, such as a transport layer attaching the bearer token to every
//! request; storage is only touched on hydrate, replace, and clear.
//!
//! The token and the user profile are stored under separate keys. They
//! are only meaningful together, so hydration treats a lone survivor as
//! corruption and discards it.

use crate::constants::storage_keys;
use crate::error::{AuthError, Result};
use crate::providers::storage::TokenStorage;
use crate::state::{Session, User};
use std::sync::{Arc, PoisonError, RwLock};

/// Session state shared between the store and the host's transport layer.
#[derive(Debug, Clone)]
pub struct SessionHandle<S> {
    storage: S,
    snapshot: Arc<RwLock<Option<Session>>>,
}

impl<S: TokenStorage> SessionHandle<S> {
    /// Create a handle over `storage` with an empty snapshot.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Load whatever storage holds into the snapshot.
    ///
    /// Called once at startup. Partial or unparseable material is removed
    /// from storage and reported as no session; a half-restored session
    /// would sign the user in with a token the backend may not honor.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when storage itself cannot be read
    /// or cleaned up.
    pub async fn hydrate(&self) -> Result<Option<Session>> {
        let token = self.storage.get(storage_keys::BEARER_TOKEN).await?;
        let user_json = self.storage.get(storage_keys::USER).await?;

        let session = match (token, user_json) {
            (Some(token), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored user profile failed to parse, discarding session");
                    self.discard_stored().await?;
                    None
                }
            },
            (None, None) => None,
            _ => {
                tracing::warn!("Session storage held only one of token and user, discarding both");
                self.discard_stored().await?;
                None
            }
        };

        *self.write_snapshot() = session.clone();
        Ok(session)
    }

    /// Install `session` as the current one and persist it.
    ///
    /// The snapshot is updated before storage is written, so the app is
    /// signed in for this run even when persistence fails.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when the session cannot be written.
    pub async fn replace(&self, session: Session) -> Result<()> {
        *self.write_snapshot() = Some(session.clone());

        let user_json = serde_json::to_string(&session.user).map_err(|e| AuthError::Storage {
            message: e.to_string(),
        })?;
        self.storage
            .put(storage_keys::BEARER_TOKEN, &session.token)
            .await?;
        self.storage.put(storage_keys::USER, &user_json).await?;
        Ok(())
    }

    /// Drop the current session from the snapshot and from storage.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] when storage cannot be written. The
    /// snapshot is cleared regardless.
    pub async fn clear(&self) -> Result<()> {
        *self.write_snapshot() = None;
        self.discard_stored().await
    }

    /// The session as of the last hydrate, replace, or clear.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bearer token of the current session, for request authentication.
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.token.clone())
    }

    async fn discard_stored(&self) -> Result<()> {
        self.storage.remove(storage_keys::BEARER_TOKEN).await?;
        self.storage.remove(storage_keys::USER).await?;
        Ok(())
    }

    fn write_snapshot(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test assertions

    use super::*;
    use crate::mocks::MemoryStorage;
    use crate::state::UserId;

    fn session() -> Session {
        Session {
            token: "bearer-1".to_string(),
            user: User {
                // Fixed id: tests compare separate calls to this fixture
                id: UserId(uuid::Uuid::nil()),
                email: "ada@divvy.app".to_string(),
                name: Some("Ada".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn replace_updates_snapshot_and_storage() {
        let storage = MemoryStorage::new();
        let handle = SessionHandle::new(storage.clone());

        handle.replace(session()).await.unwrap();

        assert_eq!(handle.current(), Some(session()));
        assert_eq!(handle.bearer_token().as_deref(), Some("bearer-1"));
        let contents = storage.contents();
        assert_eq!(
            contents.get(storage_keys::BEARER_TOKEN).map(String::as_str),
            Some("bearer-1")
        );
        assert!(contents.contains_key(storage_keys::USER));
    }

    #[tokio::test]
    async fn hydrate_restores_what_replace_wrote() {
        let storage = MemoryStorage::new();
        SessionHandle::new(storage.clone())
            .replace(session())
            .await
            .unwrap();

        // A fresh handle over the same storage sees the session
        let handle = SessionHandle::new(storage);
        let restored = handle.hydrate().await.unwrap();
        assert_eq!(restored, Some(session()));
        assert_eq!(handle.current(), Some(session()));
    }

    #[tokio::test]
    async fn hydrate_discards_a_lone_token() {
        let storage = MemoryStorage::new();
        storage
            .put(storage_keys::BEARER_TOKEN, "orphan")
            .await
            .unwrap();

        let handle = SessionHandle::new(storage.clone());
        let restored = handle.hydrate().await.unwrap();

        assert_eq!(restored, None);
        assert!(storage.contents().is_empty());
    }

    #[tokio::test]
    async fn hydrate_discards_an_unparseable_user() {
        let storage = MemoryStorage::new();
        storage
            .put(storage_keys::BEARER_TOKEN, "bearer-1")
            .await
            .unwrap();
        storage
            .put(storage_keys::USER, "not json")
            .await
            .unwrap();

        let handle = SessionHandle::new(storage.clone());
        let restored = handle.hydrate().await.unwrap();

        assert_eq!(restored, None);
        assert!(storage.contents().is_empty());
    }

    #[tokio::test]
    async fn clear_empties_snapshot_and_storage() {
        let storage = MemoryStorage::new();
        let handle = SessionHandle::new(storage.clone());
        handle.replace(session()).await.unwrap();

        handle.clear().await.unwrap();

        assert_eq!(handle.current(), None);
        assert_eq!(handle.bearer_token(), None);
        assert!(storage.contents().is_empty());
    }
}
