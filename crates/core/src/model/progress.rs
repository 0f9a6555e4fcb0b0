use rand::Rng;
use thiserror::Error;

use crate::model::word::{WordKey, WordPair};

/// Number of difficulty bins a word can move through. The top bin means
/// mastered; words there are retired from active questioning.
pub const MAX_BINS: usize = 10;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised when rehydrating word progress from persisted state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("bin {provided} out of range 0..{MAX_BINS}")]
    InvalidBin { provided: usize },

    #[error("remaining repetitions must be at least 1, got {provided}")]
    InvalidRepetitions { provided: u32 },
}

//
// ─── ANSWER MATCHING ──────────────────────────────────────────────────────────
//

/// Compare a submitted answer against the expected one, tolerating the two
/// special separators a lesson author may use.
///
/// Both sides are trimmed and lowercased first. The rules apply in order,
/// first match wins:
///
/// 1. exact equality;
/// 2. an expected answer with a single `" / "` separator also accepts the
///    two halves in swapped order;
/// 3. an expected answer with a single `" | "` separator accepts either
///    alternative on its own.
#[must_use]
pub fn answers_match(submitted: &str, expected: &str) -> bool {
    let submitted = submitted.trim().to_lowercase();
    let expected = expected.trim().to_lowercase();

    if submitted == expected {
        return true;
    }

    let swap: Vec<&str> = expected.split(" / ").collect();
    if swap.len() == 2 && submitted == format!("{} / {}", swap[1], swap[0]) {
        return true;
    }

    let alternatives: Vec<&str> = expected.split(" | ").collect();
    if alternatives.len() == 2 && alternatives.contains(&submitted.as_str()) {
        return true;
    }

    false
}

/// How many answers from now a resurfacing word becomes due.
fn resurface_delay() -> i64 {
    rand::rng().random_range(2..=3)
}

//
// ─── WORD PROGRESS ────────────────────────────────────────────────────────────
//

/// Mutable drill state of one word within a session.
///
/// Words climb one bin after `remaining_reps` correct answers; a miss keeps
/// the bin but demands two correct answers before the next climb. A
/// `due_counter` of −1 means the word is not on a schedule and may be asked
/// at any time; otherwise it is the absolute answer-counter value at which
/// the word becomes due again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordProgress {
    pair: WordPair,
    bin: usize,
    due_counter: i64,
    quiz_count: u32,
    remaining_reps: u32,
}

impl WordProgress {
    /// Fresh progress for a word entering a session: bottom bin, unscheduled.
    #[must_use]
    pub fn new(pair: WordPair) -> Self {
        Self {
            pair,
            bin: 0,
            due_counter: -1,
            quiz_count: 0,
            remaining_reps: 1,
        }
    }

    /// Rehydrate progress from a persisted snapshot entry.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the bin or repetition count is outside its
    /// valid range.
    pub fn from_persisted(
        pair: WordPair,
        bin: usize,
        due_counter: i64,
        quiz_count: u32,
        remaining_reps: u32,
    ) -> Result<Self, ProgressError> {
        if bin >= MAX_BINS {
            return Err(ProgressError::InvalidBin { provided: bin });
        }
        if remaining_reps == 0 {
            return Err(ProgressError::InvalidRepetitions {
                provided: remaining_reps,
            });
        }

        Ok(Self {
            pair,
            bin,
            due_counter,
            quiz_count,
            remaining_reps,
        })
    }

    /// Compare a submitted answer and update this word's drill state.
    ///
    /// `counter` is the session's answer counter (the caller guarantees it
    /// only increases); `bin_count` is the session's aggregate per-bin
    /// population, which this method keeps in sync when the word climbs.
    /// Side effects are confined to `self` and `bin_count`.
    pub fn compare_answer(
        &mut self,
        submitted: &str,
        counter: i64,
        bin_count: &mut [usize],
    ) -> bool {
        let correct = answers_match(submitted, &self.pair.answer);
        self.quiz_count += 1;

        if correct {
            self.remaining_reps -= 1;
            if self.remaining_reps == 0 {
                if self.bin < MAX_BINS - 1 {
                    bin_count[self.bin] -= 1;
                    self.bin += 1;
                    bin_count[self.bin] += 1;
                }
                self.due_counter = -1;
                self.remaining_reps = 1;
            } else {
                self.due_counter = counter + resurface_delay();
            }
        } else {
            self.remaining_reps = 2;
            self.due_counter = counter + resurface_delay();
        }

        correct
    }

    #[must_use]
    pub fn pair(&self) -> &WordPair {
        &self.pair
    }

    #[must_use]
    pub fn key(&self) -> WordKey {
        self.pair.key()
    }

    #[must_use]
    pub fn bin(&self) -> usize {
        self.bin
    }

    #[must_use]
    pub fn due_counter(&self) -> i64 {
        self.due_counter
    }

    /// True when the word is scheduled and its due threshold has been
    /// reached at the given counter value.
    #[must_use]
    pub fn is_due(&self, counter: i64) -> bool {
        self.due_counter != -1 && counter - self.due_counter >= 0
    }

    #[must_use]
    pub fn quiz_count(&self) -> u32 {
        self.quiz_count
    }

    #[must_use]
    pub fn remaining_reps(&self) -> u32 {
        self.remaining_reps
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::word::Side;

    fn word(answer: &str) -> WordPair {
        WordPair::new("vraag", answer, Side::Forward, 0, "What is \"\"")
    }

    #[test]
    fn matching_is_case_and_whitespace_insensitive() {
        assert!(answers_match("  Dog ", "dog"));
        assert!(answers_match("DOG", "Dog"));
        assert!(!answers_match("cat", "dog"));
    }

    #[test]
    fn slash_answers_may_swap_order() {
        assert!(answers_match("option1 / option2", "option2 / option1"));
        assert!(answers_match("option2 / option1", "option2 / option1"));
        assert!(!answers_match("option1 / option3", "option2 / option1"));
        // three parts disable the swap rule
        assert!(!answers_match("c / b / a", "a / b / c"));
    }

    #[test]
    fn pipe_answers_accept_either_alternative() {
        assert!(answers_match("a", "a | b"));
        assert!(answers_match("b", "a | b"));
        assert!(!answers_match("c", "a | b"));
    }

    #[test]
    fn correct_answer_advances_one_bin() {
        let mut bins = [0usize; MAX_BINS];
        bins[0] = 1;
        let mut progress = WordProgress::new(word("dog"));

        assert!(progress.compare_answer("dog", 1, &mut bins));
        assert_eq!(progress.bin(), 1);
        assert_eq!(bins[0], 0);
        assert_eq!(bins[1], 1);
        assert_eq!(progress.due_counter(), -1);
        assert_eq!(progress.remaining_reps(), 1);
        assert_eq!(progress.quiz_count(), 1);
    }

    #[test]
    fn miss_keeps_bin_and_demands_two_repeats() {
        let mut bins = [0usize; MAX_BINS];
        bins[0] = 1;
        let mut progress = WordProgress::new(word("dog"));

        assert!(!progress.compare_answer("cat", 5, &mut bins));
        assert_eq!(progress.bin(), 0);
        assert_eq!(bins[0], 1);
        assert_eq!(progress.remaining_reps(), 2);
        assert_eq!(progress.quiz_count(), 1);
        // resurfaces soon but not immediately
        assert!((7..=8).contains(&progress.due_counter()));
    }

    #[test]
    fn missed_word_needs_two_correct_answers_to_advance() {
        let mut bins = [0usize; MAX_BINS];
        bins[0] = 1;
        let mut progress = WordProgress::new(word("dog"));

        progress.compare_answer("cat", 1, &mut bins);
        assert!(progress.compare_answer("dog", 2, &mut bins));
        // first correct answer only pays down a repetition
        assert_eq!(progress.bin(), 0);
        assert_eq!(progress.remaining_reps(), 1);
        assert!(progress.due_counter() >= 4);

        assert!(progress.compare_answer("dog", 5, &mut bins));
        assert_eq!(progress.bin(), 1);
        assert_eq!(progress.due_counter(), -1);
    }

    #[test]
    fn bin_never_exceeds_top() {
        let mut bins = [0usize; MAX_BINS];
        bins[0] = 1;
        let mut progress = WordProgress::new(word("dog"));

        for counter in 1..=(MAX_BINS as i64 + 5) {
            progress.compare_answer("dog", counter, &mut bins);
        }

        assert_eq!(progress.bin(), MAX_BINS - 1);
        assert_eq!(bins[MAX_BINS - 1], 1);
        assert_eq!(bins.iter().sum::<usize>(), 1);
    }

    #[test]
    fn is_due_respects_sentinel_and_threshold() {
        let mut bins = [0usize; MAX_BINS];
        bins[0] = 1;
        let mut progress = WordProgress::new(word("dog"));
        assert!(!progress.is_due(100));

        progress.compare_answer("cat", 10, &mut bins);
        let due = progress.due_counter();
        assert!(!progress.is_due(due - 1));
        assert!(progress.is_due(due));
        assert!(progress.is_due(due + 10));
    }

    #[test]
    fn from_persisted_validates_ranges() {
        let err = WordProgress::from_persisted(word("dog"), MAX_BINS, -1, 0, 1).unwrap_err();
        assert!(matches!(err, ProgressError::InvalidBin { provided } if provided == MAX_BINS));

        let err = WordProgress::from_persisted(word("dog"), 0, -1, 0, 0).unwrap_err();
        assert!(matches!(err, ProgressError::InvalidRepetitions { provided: 0 }));

        let ok = WordProgress::from_persisted(word("dog"), 3, 17, 9, 2).unwrap();
        assert_eq!(ok.bin(), 3);
        assert_eq!(ok.due_counter(), 17);
        assert_eq!(ok.quiz_count(), 9);
        assert_eq!(ok.remaining_reps(), 2);
    }
}
