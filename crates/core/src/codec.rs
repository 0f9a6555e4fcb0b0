//! Compact positional serialization of session state.
//!
//! The persisted blob lives in a size-constrained key-value store, so the
//! state is encoded as fixed-shape arrays instead of key/value objects:
//!
//! `[version, counter, bins, current_word, correct_answers, bin_count[], word_states[]]`
//!
//! with each word state `[bin, due_counter, quiz_count, remaining_reps,
//! line_number, side]`. The leading version integer guards against
//! incompatible historical formats; old snapshots are discarded, never
//! migrated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Side, WordError, WordKey};
use crate::session::{SessionSnapshot, WordSnapshot};

/// Current serialization format version.
///
/// Version 2 carried four-field word states matched by list position only;
/// adding the per-entry `(line_number, side)` identity was a breaking
/// format change.
pub const VERSION: u32 = 3;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported serialization version: {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("invalid current word index: {0}")]
    InvalidCurrentIndex(i64),

    #[error(transparent)]
    Word(#[from] WordError),

    #[error("malformed state payload: {0}")]
    Json(String),
}

//
// ─── COMPACT STATE ────────────────────────────────────────────────────────────
//

/// `[bin, due_counter, quiz_count, remaining_reps, line_number, side]`
type WordTuple = (u32, i64, u32, u32, u32, u8);

/// `[version, counter, bins, current_word, correct_answers, bin_count, words]`
type StateTuple = (u32, i64, u32, i64, u32, Vec<u32>, Vec<WordTuple>);

/// The positional on-disk form of a [`SessionSnapshot`].
///
/// Serde serializes the inner tuple as a plain JSON array, so no field
/// names are repeated in the persisted blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactState(StateTuple);

impl CompactState {
    /// Encode a snapshot. Deterministic given the snapshot's word order.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn encode(snapshot: &SessionSnapshot) -> Self {
        let words = snapshot
            .words
            .iter()
            .map(|w| {
                (
                    w.bin as u32,
                    w.due_counter,
                    w.quiz_count,
                    w.remaining_reps,
                    w.key.line_number,
                    w.key.side.as_u8(),
                )
            })
            .collect();

        let current = match snapshot.current_word {
            Some(idx) => idx as i64,
            None => -1,
        };

        Self((
            VERSION,
            snapshot.counter,
            snapshot.bins as u32,
            current,
            snapshot.correct_answers,
            snapshot.bin_count.iter().map(|&c| c as u32).collect(),
            words,
        ))
    }

    /// Decode back into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::UnsupportedVersion` when the leading integer
    /// does not match [`VERSION`], and structural errors for sentinel or
    /// side values outside their domain.
    pub fn decode(&self) -> Result<SessionSnapshot, CodecError> {
        let (version, counter, bins, current, correct_answers, ref bin_count, ref words) = self.0;

        if version != VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: version,
                expected: VERSION,
            });
        }

        let current_word = match current {
            -1 => None,
            idx => Some(
                usize::try_from(idx).map_err(|_| CodecError::InvalidCurrentIndex(idx))?,
            ),
        };

        let words = words
            .iter()
            .map(|&(bin, due_counter, quiz_count, remaining_reps, line_number, side)| {
                Ok(WordSnapshot {
                    key: WordKey::new(line_number, Side::from_u8(side)?),
                    bin: bin as usize,
                    due_counter,
                    quiz_count,
                    remaining_reps,
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;

        Ok(SessionSnapshot {
            counter,
            bins: bins as usize,
            current_word,
            correct_answers,
            bin_count: bin_count.iter().map(|&c| c as usize).collect(),
            words,
        })
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.0.0
    }

    /// Canonical text encoding of the tuple.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::Json(e.to_string()))
    }

    /// Parse the canonical text encoding.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Json` for malformed payloads.
    pub fn from_json(text: &str) -> Result<Self, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Json(e.to_string()))
    }

    /// Byte length of the canonical text encoding.
    #[must_use]
    pub fn estimate_size(&self) -> usize {
        // an unserializable state must never pass the size check
        serde_json::to_string(self).map_or(usize::MAX, |s| s.len())
    }

    /// True when the encoded state fits within `max_kb` kilobytes. Callers
    /// must not persist a state failing this check; they degrade to "no
    /// saved progress" instead.
    #[must_use]
    pub fn validate_size(&self, max_kb: usize) -> bool {
        self.estimate_size() <= max_kb * 1024
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
