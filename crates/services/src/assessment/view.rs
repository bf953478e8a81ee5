use quiz_core::model::{QuizId, QuizResult, SessionId, SessionStatus};
use serde::Serialize;

/// Presentation-agnostic projection of a session.
///
/// No pre-formatted strings: the caller decides how to render the clock,
/// the question palette and the result screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub quiz_id: QuizId,
    pub status: SessionStatus,
    pub current_index: usize,
    pub total: usize,
    pub remaining_secs: u32,
    /// One flag per question, in quiz order.
    pub answered: Vec<bool>,
    pub answered_count: usize,
    pub result: Option<QuizResult>,
    pub result_id: Option<i64>,
    /// Why the most recent command was rejected, cleared by the next command.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.total.saturating_sub(self.answered_count)
    }

    /// Remaining time split into `(minutes, seconds)`.
    #[must_use]
    pub fn remaining_mm_ss(&self) -> (u32, u32) {
        (self.remaining_secs / 60, self.remaining_secs % 60)
    }
}
