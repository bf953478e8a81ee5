use chrono::Utc;
use quiz_core::model::{QuizHeader, QuizId};
use serde_json::Value;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{map_header_row, ser};
use crate::repository::{QuizRecord, QuizRepository, QuizSource, StorageError};

#[async_trait::async_trait]
impl QuizSource for SqliteRepository {
    async fn quiz_header(&self, id: &QuizId) -> Result<QuizHeader, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, title, requires_entitlement
                FROM quizzes
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_header_row(&row)
    }

    async fn fetch_quiz_by_id(&self, id: &QuizId) -> Result<Value, StorageError> {
        let row = sqlx::query("SELECT body FROM quizzes WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;

        let body: String = row.try_get("body").map_err(ser)?;
        serde_json::from_str(&body).map_err(ser)
    }
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn upsert_quiz(&self, record: &QuizRecord) -> Result<(), StorageError> {
        let body = serde_json::to_string(&record.body).map_err(ser)?;
        let requires_entitlement = i64::from(record.header.requires_entitlement);

        sqlx::query(
            r"
            INSERT INTO quizzes (id, title, requires_entitlement, body, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                requires_entitlement = excluded.requires_entitlement,
                body = excluded.body,
                updated_at = excluded.updated_at
            ",
        )
        .bind(record.header.id.as_str())
        .bind(record.header.title.as_str())
        .bind(requires_entitlement)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_quiz_headers(&self, limit: u32) -> Result<Vec<QuizHeader>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, title, requires_entitlement
                FROM quizzes
                ORDER BY id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_header_row).collect()
    }
}
