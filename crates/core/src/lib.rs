#![forbid(unsafe_code)]

//! Core engine for an adaptive vocabulary drill: lesson catalogs, per-word
//! progress tracking, the leveled-bin session scheduler, the content
//! fingerprint, and the compact state codec.

pub mod codec;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod session;

pub use codec::{CodecError, CompactState};
pub use error::Error;
pub use fingerprint::fingerprint;
pub use model::{Lesson, MAX_BINS, Side, WordKey, WordPair, WordProgress, answers_match};
pub use session::{
    DrillSession, Listener, ListenerId, SessionConfig, SessionError, SessionEvent,
    SessionSnapshot, WordSnapshot,
};
