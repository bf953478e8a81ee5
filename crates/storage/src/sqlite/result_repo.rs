use quiz_core::model::{QuizId, QuizResult};

use super::SqliteRepository;
use super::mapping::{map_result_row, map_result_row_with_id};
use crate::repository::{ResultRepository, ResultRow, StorageError};

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    quiz_id, session_id, attempted, skipped, correct,
                    total, percentage, submit_trigger, submitted_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(result.quiz_id().as_str())
        .bind(result.session_id().to_string())
        .bind(i64::from(result.attempted()))
        .bind(i64::from(result.skipped()))
        .bind(i64::from(result.correct()))
        .bind(i64::from(result.total()))
        .bind(i64::from(result.percentage()))
        .bind(result.trigger().as_str())
        .bind(result.submitted_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => StorageError::Connection(other.to_string()),
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    quiz_id, session_id, attempted, skipped, correct,
                    total, percentage, submit_trigger, submitted_at
                FROM quiz_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_result_rows(
        &self,
        quiz_id: &QuizId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, quiz_id, session_id, attempted, skipped, correct,
                    total, percentage, submit_trigger, submitted_at
                FROM quiz_results
                WHERE quiz_id = ?1
                ORDER BY submitted_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(quiz_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row_with_id(&row)?);
        }
        Ok(out)
    }
}
