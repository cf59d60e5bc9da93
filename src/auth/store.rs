use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("session record serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The three independent entries a session occupies in storage.
///
/// Each entry is written on its own; there is no cross-entry transaction,
/// so a crash mid-write can leave a partial session behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    UserRecord,
    AccessToken,
    RefreshToken,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [
        StoreKey::UserRecord,
        StoreKey::AccessToken,
        StoreKey::RefreshToken,
    ];

    /// Stable name used as the file or keychain entry name.
    pub fn name(self) -> &'static str {
        match self {
            StoreKey::UserRecord => "user",
            StoreKey::AccessToken => "access-token",
            StoreKey::RefreshToken => "refresh-token",
        }
    }
}

/// Pluggable persistence for the session entries.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError>;
    fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: StoreKey) -> Result<(), StoreError>;

    /// Remove every entry. Each key is cleared independently; all removals
    /// are attempted even when an earlier one fails.
    fn clear(&self) -> Result<(), StoreError> {
        let mut first_err = None;
        for key in StoreKey::ALL {
            if let Err(err) = self.remove(key) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory store for tests and short-lived embedding.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<StoreKey, String>> {
        // A poisoned lock only means another thread panicked mid-write;
        // the map itself is still usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(&key).cloned())
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        self.entries().remove(&key);
        Ok(())
    }
}

/// File-backed store keeping one file per entry under a session directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(key.name())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key);
        if path.exists() {
            Ok(Some(fs::read_to_string(path)?))
        } else {
            Ok(None)
        }
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
