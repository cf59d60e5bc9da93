use keyring::Entry;

use super::store::{FileStore, SessionStore, StoreError, StoreKey};

const SERVICE_NAME: &str = "storefront";

/// Store that keeps the two token entries in the OS keychain and the
/// (non-secret) user record on disk next to the config.
pub struct KeyringStore {
    files: FileStore,
}

impl KeyringStore {
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    fn entry(key: StoreKey) -> Result<Entry, StoreError> {
        Ok(Entry::new(SERVICE_NAME, key.name())?)
    }
}

impl SessionStore for KeyringStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        match key {
            StoreKey::UserRecord => self.files.get(key),
            StoreKey::AccessToken | StoreKey::RefreshToken => {
                match Self::entry(key)?.get_password() {
                    Ok(value) => Ok(Some(value)),
                    Err(keyring::Error::NoEntry) => Ok(None),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        match key {
            StoreKey::UserRecord => self.files.set(key, value),
            StoreKey::AccessToken | StoreKey::RefreshToken => {
                Self::entry(key)?.set_password(value)?;
                Ok(())
            }
        }
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        match key {
            StoreKey::UserRecord => self.files.remove(key),
            StoreKey::AccessToken | StoreKey::RefreshToken => {
                match Self::entry(key)?.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }
}
