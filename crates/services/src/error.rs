//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionId, QuizId};
use quiz_core::scorer::ScoreError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by assessment sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid quiz id: {0:?}")]
    InvalidQuizId(String),
    #[error("quiz {0} was not found")]
    NotFound(QuizId),
    #[error("quiz {quiz_id} is malformed: {reason}")]
    Malformed { quiz_id: QuizId, reason: String },
    #[error("quiz service is unavailable: {0}")]
    Unavailable(String),
    #[error("quiz {0} requires an active premium subscription")]
    NotEntitled(QuizId),
    #[error("session already finalized")]
    AlreadyFinalized,
    #[error("session is not running")]
    NotRunning,
    #[error("session was abandoned")]
    Abandoned,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("option {option_index} does not exist for question {question_id}")]
    OptionOutOfRange {
        question_id: QuestionId,
        option_index: usize,
    },
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Late actions against a finalized session are expected and not shown to the user.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, SessionError::AlreadyFinalized)
    }

    /// Maps a quiz-source failure onto the load taxonomy.
    pub(crate) fn from_source(quiz_id: &QuizId, err: StorageError) -> Self {
        match err {
            StorageError::NotFound => SessionError::NotFound(quiz_id.clone()),
            StorageError::Serialization(reason) => SessionError::Malformed {
                quiz_id: quiz_id.clone(),
                reason,
            },
            other => SessionError::Unavailable(other.to_string()),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors_map_to_load_taxonomy() {
        let id = QuizId::new("q").unwrap();
        assert!(matches!(
            SessionError::from_source(&id, StorageError::NotFound),
            SessionError::NotFound(_)
        ));
        assert!(matches!(
            SessionError::from_source(&id, StorageError::Connection("reset".into())),
            SessionError::Unavailable(_)
        ));
        assert!(matches!(
            SessionError::from_source(&id, StorageError::Serialization("bad json".into())),
            SessionError::Malformed { .. }
        ));
    }

    #[test]
    fn only_already_finalized_is_benign() {
        assert!(SessionError::AlreadyFinalized.is_benign());
        assert!(!SessionError::NotRunning.is_benign());
    }
}
