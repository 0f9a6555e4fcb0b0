use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors surfaced by blob store backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── BLOB STORE ───────────────────────────────────────────────────────────────
//

/// Opaque key-value store the engine persists session blobs into.
///
/// Implementations are synchronous; the engine never suspends on storage.
/// Values are treated as opaque strings, the store does not interpret them.
pub trait BlobStore: Send + Sync {
    /// Persist or overwrite a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot store the value.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Fetch a value; `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    fn clear(&self, key: &str) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY STORE ──────────────────────────────────────────────────────────
//

/// Reference in-memory backend, used by tests and as an ephemeral default.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> Result<T, StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock".to_owned()))?;
        Ok(f(&mut entries))
    }
}

impl BlobStore for MemoryBlobStore {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_cycle() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.load("k").unwrap(), None);

        store.save("k", "v1").unwrap();
        assert_eq!(store.load("k").unwrap(), Some("v1".to_owned()));

        store.save("k", "v2").unwrap();
        assert_eq!(store.load("k").unwrap(), Some("v2".to_owned()));

        store.clear("k").unwrap();
        assert_eq!(store.load("k").unwrap(), None);
    }

    #[test]
    fn clearing_absent_key_is_fine() {
        let store = MemoryBlobStore::new();
        store.clear("missing").unwrap();
    }
}
