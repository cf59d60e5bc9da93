use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::models::{AuthSession, User};

use super::store::{SessionStore, StoreError, StoreKey};

/// The client-side session: user identity plus the current access and
/// refresh tokens, held behind a pluggable [`SessionStore`].
///
/// The session object is injected into the API client rather than living in
/// module-level state, so embedders choose where credentials go (memory,
/// files, OS keychain).
pub struct Session {
    store: Arc<dyn SessionStore>,
    refresh_gate: Mutex<()>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current access token, if one is stored. Empty strings count as
    /// absent: a request is authenticated iff a non-empty token exists.
    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(StoreKey::AccessToken)?
            .filter(|token| !token.is_empty()))
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(StoreKey::RefreshToken)?
            .filter(|token| !token.is_empty()))
    }

    /// Stored user record. A corrupt record is logged and treated as absent
    /// rather than failing the caller.
    pub fn user(&self) -> Result<Option<User>, StoreError> {
        let Some(raw) = self.store.get(StoreKey::UserRecord)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(error = %err, "stored user record is unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    /// Persist a freshly issued session. The three entries are written
    /// independently, not transactionally.
    pub fn persist(&self, auth: &AuthSession) -> Result<(), StoreError> {
        let record = serde_json::to_string(&auth.user())?;
        self.store.set(StoreKey::UserRecord, &record)?;
        self.store.set(StoreKey::AccessToken, &auth.access_token)?;
        self.store.set(StoreKey::RefreshToken, &auth.refresh_token)?;
        Ok(())
    }

    /// Replace only the access token, as a successful refresh does.
    pub fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(StoreKey::AccessToken, token)
    }

    /// Drop the whole stored session.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }

    /// Serialize refresh attempts: the holder performs the refresh while
    /// concurrent 401s wait and then reuse the replacement token.
    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_gate.lock().await
    }
}
