use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drill_core::CompactState;

use crate::blob::{BlobStore, StorageError};

/// Key the saved session lives under in the blob store.
pub const DEFAULT_SESSION_KEY: &str = "drill-session";

//
// ─── RECORD TYPES ─────────────────────────────────────────────────────────────
//

/// Reference to a lesson as the learner selected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRef {
    pub language: String,
    pub path: String,
    pub name: String,
}

/// The persisted session blob.
///
/// `state` is optional: a session whose compact state exceeds the size
/// budget is saved without it, which degrades to "no saved progress" on the
/// next load. `fingerprint` is recomputed from the lesson source on load
/// and compared; a mismatch invalidates the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub lesson: LessonRef,
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CompactState>,
    pub saved_at: DateTime<Utc>,
}

//
// ─── SESSION STORE ────────────────────────────────────────────────────────────
//

/// Saved-session persistence over an opaque [`BlobStore`].
///
/// Loads are defensive: an undecodable record is cleared and reported as
/// absent rather than surfaced as an error, so a corrupt blob can never
/// wedge the application.
pub struct SessionStore {
    store: Arc<dyn BlobStore>,
    key: String,
}

impl SessionStore {
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self::with_key(store, DEFAULT_SESSION_KEY)
    }

    #[must_use]
    pub fn with_key(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Persist a record, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend fails.
    pub fn save(&self, record: &SavedSession) -> Result<(), StorageError> {
        let raw = serde_json::to_string(record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.save(&self.key, &raw)
    }

    /// Load the saved record, if a decodable one exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only on backend failures; a malformed record
    /// is cleared and reported as `None`.
    pub fn load(&self) -> Result<Option<SavedSession>, StorageError> {
        let Some(raw) = self.store.load(&self.key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                log::warn!("discarding undecodable saved session: {e}");
                self.store.clear(&self.key)?;
                Ok(None)
            }
        }
    }

    /// Remove the saved record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.clear(&self.key)
    }

    /// True when a record exists under the session key, decodable or not.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    pub fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.store.load(&self.key)?.is_some())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
