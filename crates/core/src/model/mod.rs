mod lesson;
mod progress;
mod word;

pub use lesson::Lesson;
pub use progress::{MAX_BINS, ProgressError, WordProgress, answers_match};
pub use word::{Side, WordError, WordKey, WordPair};
