#![forbid(unsafe_code)]

//! Application services for the drill engine: lesson loading, session
//! resumption, state saving, and the answer loop with its completion hook.

pub mod error;
pub mod lesson_service;
pub mod source;

pub use error::LessonServiceError;
pub use lesson_service::{AnswerOutcome, DrillRunner, LessonService, OpenedLesson};
pub use source::{FsLessonSource, LessonSource, MemoryLessonSource, SourceError};
