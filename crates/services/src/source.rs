use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while fetching lesson text.
///
/// A load failure is fatal for that load attempt; no partial catalog is
/// ever produced from it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("lesson {path:?} not found")]
    NotFound { path: String },

    #[error("failed to read lesson {path:?}: {message}")]
    Io { path: String, message: String },
}

//
// ─── LESSON SOURCE ────────────────────────────────────────────────────────────
//

/// Collaborator that resolves a lesson path to its raw text.
///
/// This is the only suspending seam in the engine; everything downstream of
/// the returned text is synchronous.
#[async_trait]
pub trait LessonSource: Send + Sync {
    /// Load the raw lesson text behind `path`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` when the text cannot be produced.
    async fn load(&self, path: &str) -> Result<String, SourceError>;
}

//
// ─── FILESYSTEM SOURCE ────────────────────────────────────────────────────────
//

/// Lesson files under a root directory.
#[derive(Debug, Clone)]
pub struct FsLessonSource {
    root: PathBuf,
}

impl FsLessonSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LessonSource for FsLessonSource {
    async fn load(&self, path: &str) -> Result<String, SourceError> {
        let full = self.root.join(path);
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SourceError::NotFound {
                    path: path.to_owned(),
                },
                _ => SourceError::Io {
                    path: path.to_owned(),
                    message: e.to_string(),
                },
            })
    }
}

//
// ─── IN-MEMORY SOURCE ─────────────────────────────────────────────────────────
//

/// Fixture source for tests and embedded lessons.
#[derive(Debug, Clone, Default)]
pub struct MemoryLessonSource {
    lessons: HashMap<String, String>,
}

impl MemoryLessonSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lesson(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.lessons.insert(path.into(), text.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.lessons.insert(path.into(), text.into());
    }
}

#[async_trait]
impl LessonSource for MemoryLessonSource {
    async fn load(&self, path: &str) -> Result<String, SourceError> {
        self.lessons
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                path: path.to_owned(),
            })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
