use std::sync::Arc;

use chrono::Utc;

use drill_core::{CompactState, DrillSession, Lesson, SessionConfig, SessionError};
use storage::{BlobStore, LessonRef, SavedSession, SessionStore};

use crate::error::LessonServiceError;
use crate::source::LessonSource;

/// Default ceiling for the compact state blob, matching conservative
/// per-origin quotas of browser-style key-value stores.
const DEFAULT_MAX_STATE_KB: usize = 1024;

//
// ─── LESSON SERVICE ───────────────────────────────────────────────────────────
//

/// Result of opening a lesson: the drill session plus whether saved
/// progress was restored into it.
pub struct OpenedLesson {
    pub session: DrillSession,
    pub resumed: bool,
}

/// The session owner: loads lesson text, builds or resumes a drill
/// session, and persists its state between runs.
///
/// Restore is all-or-nothing. A saved record only resumes when it refers
/// to the same lesson path, its stored fingerprint matches the freshly
/// computed one, and its compact state decodes and restores cleanly; any
/// other outcome clears the record and starts fresh. Failures on this path
/// are deliberately invisible to the learner.
pub struct LessonService {
    source: Arc<dyn LessonSource>,
    sessions: SessionStore,
    config: SessionConfig,
    max_state_kb: usize,
}

impl LessonService {
    #[must_use]
    pub fn new(source: Arc<dyn LessonSource>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            source,
            sessions: SessionStore::new(store),
            config: SessionConfig::default(),
            max_state_kb: DEFAULT_MAX_STATE_KB,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_max_state_kb(mut self, max_state_kb: usize) -> Self {
        self.max_state_kb = max_state_kb;
        self
    }

    /// Load, parse, and open a lesson, resuming saved progress when the
    /// saved record still matches the source.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Source` when the lesson text cannot be
    /// loaded (fatal for this attempt, no partial catalog), or
    /// `LessonServiceError::Storage` on backend failures.
    pub async fn open(&self, lesson_ref: &LessonRef) -> Result<OpenedLesson, LessonServiceError> {
        let text = self.source.load(&lesson_ref.path).await?;
        let lesson = Arc::new(Lesson::parse(lesson_ref.path.clone(), &text));

        if let Some(saved) = self.sessions.load()? {
            if saved.lesson.path == lesson_ref.path {
                if saved.fingerprint != lesson.fingerprint() {
                    log::warn!(
                        "lesson {} changed since last save; starting fresh",
                        lesson_ref.path
                    );
                    self.sessions.clear()?;
                } else if let Some(state) = &saved.state {
                    match Self::try_restore(&lesson, self.config, state) {
                        Ok(session) => {
                            return Ok(OpenedLesson {
                                session,
                                resumed: true,
                            });
                        }
                        Err(e) => {
                            log::warn!("discarding saved session for {}: {e}", lesson_ref.path);
                            self.sessions.clear()?;
                        }
                    }
                }
            }
        }

        Ok(OpenedLesson {
            session: DrillSession::new(lesson, self.config),
            resumed: false,
        })
    }

    fn try_restore(
        lesson: &Arc<Lesson>,
        config: SessionConfig,
        state: &CompactState,
    ) -> Result<DrillSession, drill_core::Error> {
        let snapshot = state.decode()?;
        let mut session = DrillSession::new(Arc::clone(lesson), config);
        session.restore_state(&snapshot)?;
        Ok(session)
    }

    /// Persist the session's state for later resumption.
    ///
    /// A state exceeding the size budget is saved without progress (warn,
    /// not error): on the next open the lesson starts fresh.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` on backend failures.
    pub fn save(
        &self,
        session: &DrillSession,
        lesson_ref: &LessonRef,
    ) -> Result<(), LessonServiceError> {
        let state = CompactState::encode(&session.snapshot());
        let state = if state.validate_size(self.max_state_kb) {
            Some(state)
        } else {
            log::warn!(
                "session state for {} exceeds {} KB; saving without progress",
                lesson_ref.path,
                self.max_state_kb
            );
            None
        };

        self.sessions.save(&SavedSession {
            lesson: lesson_ref.clone(),
            fingerprint: session.lesson().fingerprint().to_owned(),
            state,
            saved_at: Utc::now(),
        })?;
        Ok(())
    }

    /// Drop any saved progress.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` on backend failures.
    pub fn clear_saved(&self) -> Result<(), LessonServiceError> {
        self.sessions.clear()?;
        Ok(())
    }
}

//
// ─── DRILL RUNNER ─────────────────────────────────────────────────────────────
//

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub hint: Option<String>,
    pub finished: bool,
}

/// Drives the strict answer/next-question alternation over a session and
/// owns the single completion hook a streak or persistence collaborator
/// subscribes to. The hook fires exactly once, when the session first
/// reaches its finished state.
#[derive(Default)]
pub struct DrillRunner {
    on_complete: Option<Box<dyn FnMut() + Send>>,
    completed: bool,
}

impl DrillRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_completion_hook(mut self, hook: Box<dyn FnMut() + Send>) -> Self {
        self.on_complete = Some(hook);
        self
    }

    /// Submit an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentWord` when no question is selected.
    pub fn answer(
        &mut self,
        session: &mut DrillSession,
        submitted: &str,
    ) -> Result<AnswerOutcome, SessionError> {
        let correct = session.compare_answer(submitted)?;
        let finished = session.is_finished();

        if finished && !self.completed {
            self.completed = true;
            if let Some(hook) = &mut self.on_complete {
                hook();
            }
        }

        Ok(AnswerOutcome {
            correct,
            hint: session.hint().map(str::to_owned),
            finished,
        })
    }

    /// Move the session to its next question. Returns false once the
    /// session is finished, in which case no question is selected.
    pub fn advance(&self, session: &mut DrillSession) -> bool {
        if session.is_finished() {
            return false;
        }
        session.next_question();
        true
    }
}
