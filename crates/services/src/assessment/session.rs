use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerStore, Countdown, Navigator, QuestionId, QuizDefinition, QuizResult, SessionId,
    SessionStatus, SubmitTrigger, TickOutcome,
};
use quiz_core::scorer::{self, ScoreError};

use super::view::SessionSnapshot;
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of a submit attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalization {
    /// This call performed the transition to `Completed`.
    Fresh(QuizResult),
    /// The session was already completed; the original result is returned unchanged.
    Previous(QuizResult),
}

impl Finalization {
    #[must_use]
    pub fn result(&self) -> &QuizResult {
        match self {
            Finalization::Fresh(r) | Finalization::Previous(r) => r,
        }
    }

    #[must_use]
    pub fn is_fresh(&self) -> bool {
        matches!(self, Finalization::Fresh(_))
    }
}

/// What a single countdown tick did to the session.
#[derive(Debug)]
pub enum SessionTick {
    Ignored,
    Remaining(u32),
    /// The countdown expired and the session was auto-submitted.
    Expired(Result<Finalization, SessionError>),
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Ready,
    Running,
    Submitting(SubmitTrigger),
    Completed(QuizResult),
    Failed(ScoreError),
    Abandoned,
}

impl Phase {
    fn status(&self) -> SessionStatus {
        match self {
            Phase::Ready => SessionStatus::Ready,
            Phase::Running => SessionStatus::Running,
            Phase::Submitting(_) => SessionStatus::Submitting,
            Phase::Completed(_) => SessionStatus::Completed,
            Phase::Failed(_) => SessionStatus::Failed,
            Phase::Abandoned => SessionStatus::Abandoned,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a quiz.
///
/// Owns the answers, the question pointer and the countdown, and is the only place
/// that moves between lifecycle states. Every submit path funnels through a single
/// status check, so whichever of manual submit or expiration arrives first finalizes
/// the attempt and the other observes the stored result.
pub struct AssessmentSession {
    id: SessionId,
    quiz: Arc<QuizDefinition>,
    answers: AnswerStore,
    navigator: Navigator,
    countdown: Countdown,
    phase: Phase,
    result_id: Option<i64>,
    persist_error: Option<String>,
}

impl AssessmentSession {
    #[must_use]
    pub fn new(quiz: QuizDefinition) -> Self {
        let navigator = Navigator::new(quiz.total());
        let countdown = Countdown::new(quiz.duration_secs());
        Self {
            id: SessionId::generate(),
            quiz: Arc::new(quiz),
            answers: AnswerStore::new(),
            navigator,
            countdown,
            phase: Phase::Ready,
            result_id: None,
            persist_error: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn quiz(&self) -> &Arc<QuizDefinition> {
        &self.quiz
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.phase.status()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.navigator.current()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining_secs()
    }

    #[must_use]
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.phase {
            Phase::Completed(result) => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    #[must_use]
    pub fn persist_error(&self) -> Option<&str> {
        self.persist_error.as_deref()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status().is_terminal()
    }

    /// Arms the countdown and moves `Ready -> Running`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinalized` for a completed or failed session and
    /// `SessionError::NotRunning` if the session is past `Ready` but not yet finalized,
    /// and `SessionError::Abandoned` once left.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Ready => {
                self.countdown.start();
                self.phase = Phase::Running;
                Ok(())
            }
            Phase::Completed(_) | Phase::Failed(_) => Err(SessionError::AlreadyFinalized),
            Phase::Abandoned => Err(SessionError::Abandoned),
            Phase::Running | Phase::Submitting(_) => Err(SessionError::NotRunning),
        }
    }

    /// Records an answer (last write wins). Returns the previous selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinalized` after completion, `SessionError::NotRunning`
    /// before start, and `UnknownQuestion` / `OptionOutOfRange` for invalid input.
    pub fn select(
        &mut self,
        question_id: &QuestionId,
        option_index: usize,
    ) -> Result<Option<usize>, SessionError> {
        self.ensure_running()?;
        let question = self
            .quiz
            .question(question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.clone()))?;
        if !question.has_option(option_index) {
            return Err(SessionError::OptionOutOfRange {
                question_id: question_id.clone(),
                option_index,
            });
        }
        Ok(self.answers.select(question_id.clone(), option_index))
    }

    /// Selects an option on the question currently shown.
    ///
    /// # Errors
    ///
    /// Same as [`AssessmentSession::select`].
    pub fn select_current(&mut self, option_index: usize) -> Result<Option<usize>, SessionError> {
        let question_id = self
            .quiz
            .question_at(self.navigator.current())
            .map(|q| q.id().clone())
            .ok_or(SessionError::NotRunning)?;
        self.select(&question_id, option_index)
    }

    /// Moves to `index` (clamped). Ignored unless the session is running.
    pub fn go_to(&mut self, index: usize) -> usize {
        if self.phase == Phase::Running {
            self.navigator.go_to(index);
        }
        self.navigator.current()
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.navigator.current().saturating_add(1))
    }

    pub fn previous(&mut self) -> usize {
        self.go_to(self.navigator.current().saturating_sub(1))
    }

    /// Feeds one elapsed second into the countdown; auto-submits on expiry.
    pub fn tick(&mut self, now: DateTime<Utc>) -> SessionTick {
        if self.phase != Phase::Running {
            return SessionTick::Ignored;
        }
        match self.countdown.tick() {
            TickOutcome::Ignored => SessionTick::Ignored,
            TickOutcome::Remaining(secs) => SessionTick::Remaining(secs),
            TickOutcome::Expired => {
                tracing::info!(session_id = %self.id, quiz_id = %self.quiz.id(), "countdown expired");
                SessionTick::Expired(self.finalize(SubmitTrigger::Expired, now))
            }
        }
    }

    /// User-confirmed submission.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` before the session started, and the stored
    /// `SessionError::Score` if an earlier finalization failed.
    pub fn submit_manual(&mut self, now: DateTime<Utc>) -> Result<Finalization, SessionError> {
        self.finalize(SubmitTrigger::Manual, now)
    }

    /// Cancels the countdown without submitting; the attempt is discarded and
    /// rejects any further answers or submits. No-op once finalized.
    pub fn abandon(&mut self) {
        if !matches!(self.phase, Phase::Ready | Phase::Running) {
            return;
        }
        self.countdown.cancel();
        self.phase = Phase::Abandoned;
        tracing::debug!(session_id = %self.id, status = self.status().as_str(), "session abandoned");
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let answered: Vec<bool> = self
            .quiz
            .questions()
            .iter()
            .map(|q| self.answers.is_answered(q.id()))
            .collect();
        SessionSnapshot {
            session_id: self.id,
            quiz_id: self.quiz.id().clone(),
            status: self.status(),
            current_index: self.navigator.current(),
            total: self.quiz.total(),
            remaining_secs: self.countdown.remaining_secs(),
            answered_count: self.answers.answered_count(),
            answered,
            result: self.result().cloned(),
            result_id: self.result_id,
            last_error: None,
        }
    }

    pub(crate) fn set_result_id(&mut self, id: i64) {
        self.result_id = Some(id);
    }

    pub(crate) fn set_persist_error(&mut self, error: String) {
        self.persist_error = Some(error);
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Running => Ok(()),
            Phase::Completed(_) | Phase::Failed(_) | Phase::Submitting(_) => {
                Err(SessionError::AlreadyFinalized)
            }
            Phase::Abandoned => Err(SessionError::Abandoned),
            Phase::Ready => Err(SessionError::NotRunning),
        }
    }

    // Single-writer guard: only a call that finds the session `Running` may finalize.
    fn finalize(
        &mut self,
        trigger: SubmitTrigger,
        now: DateTime<Utc>,
    ) -> Result<Finalization, SessionError> {
        match &self.phase {
            Phase::Running => {}
            Phase::Completed(result) => {
                tracing::debug!(session_id = %self.id, trigger = trigger.as_str(), "late submit ignored");
                return Ok(Finalization::Previous(result.clone()));
            }
            Phase::Failed(err) => return Err(SessionError::Score(err.clone())),
            Phase::Submitting(_) => return Err(SessionError::AlreadyFinalized),
            Phase::Abandoned => return Err(SessionError::Abandoned),
            Phase::Ready => return Err(SessionError::NotRunning),
        }

        self.phase = Phase::Submitting(trigger);
        self.countdown.stop();

        match scorer::score(&self.quiz, &self.answers) {
            Ok(score) => {
                let result = QuizResult::new(self.quiz.id().clone(), self.id, score, trigger, now);
                tracing::info!(
                    session_id = %self.id,
                    quiz_id = %self.quiz.id(),
                    trigger = trigger.as_str(),
                    correct = score.correct,
                    total = score.total,
                    "session completed"
                );
                self.phase = Phase::Completed(result.clone());
                Ok(Finalization::Fresh(result))
            }
            Err(err) => {
                tracing::error!(session_id = %self.id, error = %err, "scoring failed");
                self.phase = Phase::Failed(err.clone());
                Err(SessionError::Score(err))
            }
        }
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("id", &self.id)
            .field("quiz_id", self.quiz.id())
            .field("status", &self.status())
            .field("current", &self.navigator.current())
            .field("answered", &self.answers.answered_count())
            .field("remaining_secs", &self.countdown.remaining_secs())
            .field("result_id", &self.result_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
