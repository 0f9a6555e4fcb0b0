use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::model::{Lesson, MAX_BINS, ProgressError, WordKey, WordProgress};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("bin count must be in {MIN_BINS}..={MAX_BINS}, got {provided}")]
    InvalidBins { provided: usize },

    #[error("working set cap must be at least 1")]
    InvalidWorkingSet,

    #[error("no question has been selected yet")]
    NoCurrentWord,

    #[error("snapshot word {key} not present in lesson")]
    UnknownWord { key: WordKey },

    #[error("snapshot is internally inconsistent")]
    CorruptSnapshot,

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

pub const MIN_BINS: usize = 3;

const DEFAULT_BINS: usize = 4;
const DEFAULT_MAX_WORDS: usize = 15;

/// Tunables for a drill session.
///
/// `bins` is the number of active difficulty bins; a word reaching the top
/// bin is considered mastered and retired from questioning. `max_words`
/// caps the working subset sampled from the lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    bins: usize,
    max_words: usize,
}

impl SessionConfig {
    /// Create a config, validating the bin count and working-set cap.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidBins` if `bins` is outside
    /// `MIN_BINS..=MAX_BINS`, or `SessionError::InvalidWorkingSet` if
    /// `max_words` is zero.
    pub fn new(bins: usize, max_words: usize) -> Result<Self, SessionError> {
        if !(MIN_BINS..=MAX_BINS).contains(&bins) {
            return Err(SessionError::InvalidBins { provided: bins });
        }
        if max_words == 0 {
            return Err(SessionError::InvalidWorkingSet);
        }
        Ok(Self { bins, max_words })
    }

    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[must_use]
    pub fn max_words(&self) -> usize {
        self.max_words
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

//
// ─── EVENTS ───────────────────────────────────────────────────────────────────
//

/// Change notifications delivered synchronously to registered listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Fired after every `next_question` and after a successful restore.
    QuestionChanged,
    /// Fired after every correct `compare_answer`.
    AnswerCorrect,
}

/// Handle returned by `add_listener`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Boxed listener callback; receives every event fired by the session it
/// is registered on.
pub type Listener = Box<dyn FnMut(SessionEvent) + Send>;

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// Persisted drill state of one word, keyed by its durable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSnapshot {
    pub key: WordKey,
    pub bin: usize,
    pub due_counter: i64,
    pub quiz_count: u32,
    pub remaining_reps: u32,
}

/// Full exportable state of a session, in working-list order.
///
/// `bin_count` holds the populations of the `bins` active bins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub counter: i64,
    pub bins: usize,
    pub current_word: Option<usize>,
    pub correct_answers: u32,
    pub bin_count: Vec<usize>,
    pub words: Vec<WordSnapshot>,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// One adaptive drill over a bounded working subset of a lesson.
///
/// The session owns a `WordProgress` per chosen word and keeps the
/// `bin_count` aggregate in lockstep with them. All operations are
/// synchronous; the caller alternates `next_question` and `compare_answer`
/// with at most one question in flight. Listener callbacks run inside the
/// triggering call and must not re-enter the session.
pub struct DrillSession {
    lesson: Arc<Lesson>,
    words: Vec<WordProgress>,
    bins: usize,
    counter: i64,
    bin_count: [usize; MAX_BINS],
    current: Option<usize>,
    correct_answers: u32,
    hint: Option<String>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
}

impl DrillSession {
    /// Start a fresh session over a lesson.
    ///
    /// When the lesson holds more words than the configured cap, a uniform
    /// random subset of `max_words` is drilled; otherwise every word takes
    /// part. All words start in the bottom bin and the working list is
    /// shuffled.
    #[must_use]
    pub fn new(lesson: Arc<Lesson>, config: SessionConfig) -> Self {
        let mut rng = rand::rng();
        let mut pairs = lesson.words().to_vec();
        if pairs.len() > config.max_words {
            pairs.shuffle(&mut rng);
            pairs.truncate(config.max_words);
        }

        let mut words: Vec<WordProgress> = pairs.into_iter().map(WordProgress::new).collect();
        words.shuffle(&mut rng);

        let mut bin_count = [0; MAX_BINS];
        bin_count[0] = words.len();
        let current = if words.is_empty() { None } else { Some(0) };

        Self {
            lesson,
            words,
            bins: config.bins(),
            counter: 1,
            bin_count,
            current,
            correct_answers: 0,
            hint: None,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// True when every bin below the top one is empty, i.e. all words in
    /// the working subset have been mastered.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        (0..self.bins - 1).all(|b| self.bin_count[b] == 0)
    }

    /// Select the next word to ask.
    ///
    /// The working list is reshuffled first so ties break differently on
    /// every call. Only words below the top bin are considered. Among those,
    /// a scheduled word whose due threshold has been reached wins (the one
    /// with the largest threshold when several are due); otherwise two
    /// independent samples are drawn from the unscheduled words and the one
    /// in the lower bin is kept; otherwise one uniform pick among the
    /// remaining candidates. With no candidate at all the current question
    /// becomes unset.
    pub fn next_question(&mut self) {
        let mut rng = rand::rng();
        self.words.shuffle(&mut rng);

        let eligible: Vec<usize> = (0..self.words.len())
            .filter(|&i| self.words[i].bin() < self.bins - 1)
            .collect();

        let due = eligible
            .iter()
            .copied()
            .filter(|&i| self.words[i].is_due(self.counter))
            .max_by_key(|&i| self.words[i].due_counter());

        self.current = due.or_else(|| {
            let unscheduled: Vec<usize> = eligible
                .iter()
                .copied()
                .filter(|&i| self.words[i].due_counter() == -1)
                .collect();

            if !unscheduled.is_empty() {
                let a = unscheduled[rng.random_range(0..unscheduled.len())];
                let b = unscheduled[rng.random_range(0..unscheduled.len())];
                Some(if self.words[b].bin() < self.words[a].bin() {
                    b
                } else {
                    a
                })
            } else if !eligible.is_empty() {
                Some(eligible[rng.random_range(0..eligible.len())])
            } else {
                None
            }
        });

        self.fire(SessionEvent::QuestionChanged);
    }

    /// Compare the submitted answer against the current word.
    ///
    /// Clears any previous hint; on a miss, sets a confusable-pair hint when
    /// the submission is a valid answer to some other question in the
    /// lesson. Increments the answer counter exactly once per call.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentWord` if no question is selected.
    pub fn compare_answer(&mut self, submitted: &str) -> Result<bool, SessionError> {
        let idx = self.current.ok_or(SessionError::NoCurrentWord)?;

        let correct = self.words[idx].compare_answer(submitted, self.counter, &mut self.bin_count);

        self.hint = None;
        if correct {
            self.correct_answers += 1;
            self.fire(SessionEvent::AnswerCorrect);
        } else if let Some(other) = self.lesson.question_for_answer(submitted) {
            self.hint = Some(format!(
                "You may be confused with \"{submitted}\" -> \"{other}\""
            ));
        }

        self.counter += 1;
        Ok(correct)
    }

    /// The current question, rendered into its template.
    ///
    /// The question text is inserted right after the first quote of the
    /// `""` marker; a template without the marker is used as a prefix.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentWord` before the first question.
    pub fn question(&self) -> Result<String, SessionError> {
        let word = self.current_progress()?;
        let template = &word.pair().template;
        let question = &word.pair().question;

        Ok(match template.find("\"\"") {
            Some(pos) => format!(
                "{}{}{}",
                &template[..pos + 1],
                question,
                &template[pos + 1..]
            ),
            None => format!("{template} {question}"),
        })
    }

    /// The expected answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentWord` before the first question.
    pub fn correct_answer(&self) -> Result<&str, SessionError> {
        Ok(&self.current_progress()?.pair().answer)
    }

    /// Hint set by the most recent incorrect answer, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// The identity of the current word, if a question is selected.
    #[must_use]
    pub fn current_key(&self) -> Option<WordKey> {
        self.current.map(|i| self.words[i].key())
    }

    /// The `amount` most-asked words, descending by attempt count.
    #[must_use]
    pub fn most_difficult(&self, amount: usize) -> Vec<&WordProgress> {
        let mut all: Vec<&WordProgress> = self.words.iter().collect();
        all.sort_by(|a, b| b.quiz_count().cmp(&a.quiz_count()));
        all.truncate(amount);
        all
    }

    /// Up to `count` shuffled wrong answers for the current question, drawn
    /// from same-side words of the whole lesson. Answers equal to `correct`
    /// after trimming and lowercasing are excluded. Returns an empty list
    /// when no question is selected.
    #[must_use]
    pub fn random_incorrect_answers(&self, correct: &str, count: usize) -> Vec<String> {
        let Some(idx) = self.current else {
            return Vec::new();
        };
        let side = self.words[idx].pair().side;
        let correct = correct.trim().to_lowercase();

        let mut answers: Vec<String> = self
            .lesson
            .words()
            .iter()
            .filter(|w| w.side == side)
            .map(|w| w.answer.clone())
            .filter(|a| a.trim().to_lowercase() != correct)
            .collect();

        answers.shuffle(&mut rand::rng());
        answers.truncate(count);
        answers
    }

    #[must_use]
    pub fn counter(&self) -> i64 {
        self.counter
    }

    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Number of words currently in the given bin.
    #[must_use]
    pub fn bin_count(&self, bin: usize) -> usize {
        self.bin_count[bin]
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    /// Size of the working subset.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn lesson(&self) -> &Arc<Lesson> {
        &self.lesson
    }

    //
    // ─── STATE EXPORT / IMPORT ────────────────────────────────────────────
    //

    /// Defensive copy of the full session state, in working-list order.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            counter: self.counter,
            bins: self.bins,
            current_word: self.current,
            correct_answers: self.correct_answers,
            bin_count: self.bin_count[..self.bins].to_vec(),
            words: self
                .words
                .iter()
                .map(|w| WordSnapshot {
                    key: w.key(),
                    bin: w.bin(),
                    due_counter: w.due_counter(),
                    quiz_count: w.quiz_count(),
                    remaining_reps: w.remaining_reps(),
                })
                .collect(),
        }
    }

    /// Rehydrate the session from a snapshot taken against the same lesson.
    ///
    /// Every snapshot entry is matched back to its lesson word by
    /// `(line_number, side)` identity. Validation happens up front; a
    /// failing restore leaves the session untouched. Fires
    /// `QuestionChanged` on success.
    ///
    /// # Errors
    ///
    /// - `InvalidBins` if the stored bin count is out of range;
    /// - `UnknownWord` if an entry has no matching word in the lesson; that
    ///   is a lesson/session mismatch the fingerprint check upstream should
    ///   have caught, so this fails fast instead of silently dropping
    ///   entries;
    /// - `CorruptSnapshot` if the stored aggregates disagree with the
    ///   entries or the current index is out of bounds;
    /// - `Progress` if an entry holds an out-of-range field.
    pub fn restore_state(&mut self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        if !(MIN_BINS..=MAX_BINS).contains(&snapshot.bins) {
            return Err(SessionError::InvalidBins {
                provided: snapshot.bins,
            });
        }
        if snapshot.bin_count.len() != snapshot.bins {
            return Err(SessionError::CorruptSnapshot);
        }

        let mut words = Vec::with_capacity(snapshot.words.len());
        for entry in &snapshot.words {
            let pair = self
                .lesson
                .words()
                .iter()
                .find(|w| w.key() == entry.key)
                .ok_or(SessionError::UnknownWord { key: entry.key })?;
            words.push(WordProgress::from_persisted(
                pair.clone(),
                entry.bin,
                entry.due_counter,
                entry.quiz_count,
                entry.remaining_reps,
            )?);
        }

        let mut bin_count = [0; MAX_BINS];
        bin_count[..snapshot.bins].copy_from_slice(&snapshot.bin_count);

        let mut derived = [0usize; MAX_BINS];
        for word in &words {
            derived[word.bin()] += 1;
        }
        if derived != bin_count {
            return Err(SessionError::CorruptSnapshot);
        }

        if let Some(idx) = snapshot.current_word {
            if idx >= words.len() {
                return Err(SessionError::CorruptSnapshot);
            }
        }

        self.words = words;
        self.bins = snapshot.bins;
        self.counter = snapshot.counter;
        self.bin_count = bin_count;
        self.current = snapshot.current_word;
        self.correct_answers = snapshot.correct_answers;
        self.hint = None;

        self.fire(SessionEvent::QuestionChanged);
        Ok(())
    }

    //
    // ─── LISTENERS ────────────────────────────────────────────────────────
    //

    /// Register a change listener. Notifications are synchronous and
    /// delivered in registration order.
    pub fn add_listener(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregister a listener. Returns false if the id was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn fire(&mut self, event: SessionEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    fn current_progress(&self) -> Result<&WordProgress, SessionError> {
        self.current
            .map(|i| &self.words[i])
            .ok_or(SessionError::NoCurrentWord)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
