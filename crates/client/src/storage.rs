//! Durable key/value storage for the session credential.
//!
//! The session persists two keys: the auth token ([`AUTH_TOKEN_KEY`]) and a
//! hint of the role established at login ([`USER_ROLE_KEY`]).
//! [`FileTokenStore`] keeps them in a small JSON file; [`MemoryTokenStore`]
//! keeps them for the life of the process.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;

/// Key of the persisted auth token.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Key of the persisted role hint.
pub const USER_ROLE_KEY: &str = "userType";

/// Errors that can occur when reading or writing the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file exists but is not valid JSON.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable string key/value store.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read a value; `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File store
// ─────────────────────────────────────────────────────────────────────────────

/// Store backed by a JSON object in a single file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// original, so a crash never leaves a half-written store. Writers are
/// serialized through an async mutex.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

type Entries = BTreeMap<String, String>;

impl FileTokenStore {
    /// Create a store at `path`. The file and its parent directory are created
    /// on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Location of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load for modification. A corrupt file is replaced rather than
    /// blocking every future write.
    async fn load_for_write(&self) -> Result<Entries, StorageError> {
        match self.load().await {
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding corrupt token store");
                Ok(Entries::new())
            }
            other => other,
        }
    }

    async fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut entries = self.load().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_for_write().await?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_for_write().await?;
        entries.remove(key);
        if entries.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        self.save(&entries).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);

        store.set(AUTH_TOKEN_KEY, "tok").await.unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("tok"));

        store.remove(AUTH_TOKEN_KEY).await.unwrap();
        store.remove(AUTH_TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileTokenStore::new(&path);
        store.set(AUTH_TOKEN_KEY, "tok-1").await.unwrap();
        store.set(USER_ROLE_KEY, "business").await.unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(reopened.get(USER_ROLE_KEY).await.unwrap().as_deref(), Some("business"));
    }

    #[tokio::test]
    async fn test_file_store_removes_file_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);

        store.set(AUTH_TOKEN_KEY, "tok").await.unwrap();
        store.set(USER_ROLE_KEY, "customer").await.unwrap();
        store.remove(AUTH_TOKEN_KEY).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.get(USER_ROLE_KEY).await.unwrap().as_deref(), Some("customer"));

        store.remove(USER_ROLE_KEY).await.unwrap();
        assert!(!path.exists());
        store.remove(USER_ROLE_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_reads_but_not_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(
            store.get(AUTH_TOKEN_KEY).await,
            Err(StorageError::Corrupt(_))
        ));

        store.remove(AUTH_TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    }
}
