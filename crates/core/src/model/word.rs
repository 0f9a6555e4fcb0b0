use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when rebuilding word identities from persisted data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WordError {
    #[error("invalid side value: {0}")]
    InvalidSide(u8),
}

//
// ─── SIDE ─────────────────────────────────────────────────────────────────────
//

/// Which column of the original lesson line is being asked.
///
/// A lesson line `question, answer` yields a `Forward` pair (asking for the
/// answer column) and, when the lesson asks both ways, a `Reverse` pair with
/// the columns swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Asking the original question, expecting the answer column.
    Forward,
    /// Columns swapped: asking the answer, expecting the question column.
    Reverse,
}

impl Side {
    /// Converts a persisted numeric side (0 or 1) back to a `Side`.
    ///
    /// # Errors
    ///
    /// Returns `WordError::InvalidSide` for any other value.
    pub fn from_u8(value: u8) -> Result<Self, WordError> {
        match value {
            0 => Ok(Self::Forward),
            1 => Ok(Self::Reverse),
            _ => Err(WordError::InvalidSide(value)),
        }
    }

    /// Numeric form used in the compact persisted state.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Side::Forward => 0,
            Side::Reverse => 1,
        }
    }
}

//
// ─── WORD KEY ─────────────────────────────────────────────────────────────────
//

/// Durable identity of a word across sessions.
///
/// Question and answer text are not safe identity keys because duplicate
/// lines are filtered during parsing; the pair of source line position and
/// side is unique within one lesson and survives a save/restore cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordKey {
    pub line_number: u32,
    pub side: Side,
}

impl WordKey {
    #[must_use]
    pub fn new(line_number: u32, side: Side) -> Self {
        Self { line_number, side }
    }
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_number, self.side.as_u8())
    }
}

//
// ─── WORD PAIR ────────────────────────────────────────────────────────────────
//

/// One question/answer pair of a lesson, immutable once parsed.
///
/// `template` is the question phrasing containing the placeholder marker
/// `""` into which the question text is substituted when the question is
/// rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPair {
    pub question: String,
    pub answer: String,
    pub side: Side,
    pub line_number: u32,
    pub template: String,
}

impl WordPair {
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        side: Side,
        line_number: u32,
        template: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            side,
            line_number,
            template: template.into(),
        }
    }

    /// The durable identity of this pair.
    #[must_use]
    pub fn key(&self) -> WordKey {
        WordKey::new(self.line_number, self.side)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_numeric_conversion_round_trips() {
        assert_eq!(Side::from_u8(0).unwrap(), Side::Forward);
        assert_eq!(Side::from_u8(1).unwrap(), Side::Reverse);
        assert_eq!(Side::Forward.as_u8(), 0);
        assert_eq!(Side::Reverse.as_u8(), 1);
    }

    #[test]
    fn side_rejects_out_of_range() {
        let err = Side::from_u8(2).unwrap_err();
        assert!(matches!(err, WordError::InvalidSide(2)));
    }

    #[test]
    fn key_identifies_line_and_side() {
        let pair = WordPair::new("hond", "dog", Side::Forward, 7, "What is \"\"");
        assert_eq!(pair.key(), WordKey::new(7, Side::Forward));
        assert_eq!(pair.key().to_string(), "7:0");
    }

    #[test]
    fn forward_and_reverse_keys_differ_on_same_line() {
        let fwd = WordPair::new("hond", "dog", Side::Forward, 3, "t");
        let rev = WordPair::new("dog", "hond", Side::Reverse, 3, "t");
        assert_ne!(fwd.key(), rev.key());
    }
}
