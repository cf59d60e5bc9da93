//! Session lifecycle and credential storage.
//!
//! This module provides:
//! - `Session`: the injected session object over a pluggable store
//! - `SessionStore`: the persistence seam, with `MemoryStore` and
//!   `FileStore` backends
//! - `KeyringStore`: OS keychain storage for the token entries
//!
//! Tokens expire server-side; expiry is discovered reactively through 401
//! responses, never predicted locally.

pub mod keychain;
pub mod session;
pub mod store;

pub use keychain::KeyringStore;
pub use session::Session;
pub use store::{FileStore, MemoryStore, SessionStore, StoreError, StoreKey};
