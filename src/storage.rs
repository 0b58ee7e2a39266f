//! Persisted origin-local key/value storage for credentials.
//!
//! DESIGN
//! ======
//! Mirrors browser local storage: flat string keys to string values, survives
//! restarts, no expiry. The user is stored as a JSON string under [`USER_KEY`].
//! `FileStorage` rewrites the whole file on every mutation through a temp file
//! and rename, so a crash never leaves a half-written credential file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StorageError;
use crate::types::{LoginResponse, User};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// String key/value storage that outlives the process.
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Storage backed by a single JSON object file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_all(&entries)
    }

    /// Removing from an unparseable file resets it to empty; its contents are
    /// unreachable through `get` anyway.
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(path = %self.path.display(), %reason, "resetting corrupt session file");
                return self.write_all(&BTreeMap::new());
            }
            Err(e) => return Err(e),
        };
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

// =============================================================================
// SESSION HELPERS
// =============================================================================

/// Read the access token, treating an empty value as absent.
pub fn access_token(storage: &dyn TokenStorage) -> Result<Option<String>, StorageError> {
    Ok(storage.get(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()))
}

/// Read the refresh token, treating an empty value as absent.
pub fn refresh_token(storage: &dyn TokenStorage) -> Result<Option<String>, StorageError> {
    Ok(storage.get(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty()))
}

/// Persist everything a successful sign-in returned.
pub fn persist_login(storage: &dyn TokenStorage, login: &LoginResponse) -> Result<(), StorageError> {
    storage.set(ACCESS_TOKEN_KEY, &login.access_token)?;
    match &login.refresh_token {
        Some(token) => storage.set(REFRESH_TOKEN_KEY, token)?,
        None => storage.remove(REFRESH_TOKEN_KEY)?,
    }
    store_user(storage, &login.user)
}

pub fn store_user(storage: &dyn TokenStorage, user: &User) -> Result<(), StorageError> {
    storage.set(USER_KEY, &serde_json::to_string(user)?)
}

/// Load the persisted user. A malformed entry reads as no user.
pub fn load_user(storage: &dyn TokenStorage) -> Result<Option<User>, StorageError> {
    let Some(raw) = storage.get(USER_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<User>(&raw) {
        Ok(user) => Ok(Some(user)),
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed persisted user");
            Ok(None)
        }
    }
}

/// Remove every session key.
pub fn clear_session(storage: &dyn TokenStorage) -> Result<(), StorageError> {
    storage.remove(ACCESS_TOKEN_KEY)?;
    storage.remove(REFRESH_TOKEN_KEY)?;
    storage.remove(USER_KEY)
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
