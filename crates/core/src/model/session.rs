use serde::{Deserialize, Serialize};

/// Externally visible lifecycle of an assessment attempt.
///
/// ```text
/// Loading -> Ready -> Running -> Submitting -> Completed
///    |         |         |          |
///    +-> Failed|         |          +-> Failed
///              +---------+-> Abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Held by callers while a quiz is being fetched; a session object only
    /// exists from `Ready` on and never reports this.
    Loading,
    Ready,
    Running,
    Submitting,
    Completed,
    Failed,
    /// Left without submitting; no result exists.
    Abandoned,
}

impl SessionStatus {
    /// Completed, Failed and Abandoned are final; nothing leaves them.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Abandoned
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Ready => "ready",
            SessionStatus::Running => "running",
            SessionStatus::Submitting => "submitting",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}
