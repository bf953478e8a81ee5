use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use quiz_core::Clock;
use quiz_core::model::{QuizId, QuizResult, SubmitTrigger};
use storage::repository::{InMemoryRepository, ResultRepository};

use crate::error::SessionError;

/// Storage identifier for a persisted result.
pub type ResultId = i64;

/// Presentation-agnostic list item for a stored result.
///
/// No pre-formatted strings; the UI formats timestamps and percentages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultListItem {
    pub id: ResultId,
    pub submitted_at: DateTime<Utc>,
    pub trigger: SubmitTrigger,

    pub attempted: u32,
    pub skipped: u32,
    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
}

impl ResultListItem {
    #[must_use]
    pub fn from_result(id: ResultId, result: &QuizResult) -> Self {
        Self {
            id,
            submitted_at: result.submitted_at(),
            trigger: result.trigger(),
            attempted: result.attempted(),
            skipped: result.skipped(),
            correct: result.correct(),
            total: result.total(),
            percentage: result.percentage(),
        }
    }
}

/// Read side of stored results.
#[derive(Clone)]
pub struct ResultHistoryService {
    clock: Clock,
    results: Arc<dyn ResultRepository>,
}

impl ResultHistoryService {
    #[must_use]
    pub fn new(clock: Clock, results: Arc<dyn ResultRepository>) -> Self {
        Self { clock, results }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(clock, Arc::new(InMemoryRepository::new()))
    }

    /// Newest-first results for a quiz submitted within the last `days` days.
    ///
    /// A range reaching past the representable calendar applies no lower bound.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidQuizId` for a blank id and
    /// `SessionError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        quiz_id: &str,
        days: i64,
        limit: u32,
    ) -> Result<Vec<ResultListItem>, SessionError> {
        let quiz_id =
            QuizId::new(quiz_id).map_err(|_| SessionError::InvalidQuizId(quiz_id.to_owned()))?;
        let since = chrono::Duration::try_days(days)
            .and_then(|range| self.clock.now().checked_sub_signed(range));
        let rows = self.results.list_result_rows(&quiz_id, limit).await?;

        Ok(rows
            .iter()
            .filter(|row| since.is_none_or(|since| row.result.submitted_at() >= since))
            .map(|row| ResultListItem::from_result(row.id, &row.result))
            .collect())
    }

    /// Fetch a stored result by id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when repository access fails or the id is unknown.
    pub async fn get_result(&self, id: ResultId) -> Result<QuizResult, SessionError> {
        Ok(self.results.get_result(id).await?)
    }
}
