#![forbid(unsafe_code)]

//! Persistence layer: the opaque key-value blob store contract and the
//! saved-session record layered on top of it.

pub mod blob;
pub mod session_store;

pub use blob::{BlobStore, MemoryBlobStore, StorageError};
pub use session_store::{DEFAULT_SESSION_KEY, LessonRef, SavedSession, SessionStore};
