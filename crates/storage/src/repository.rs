use async_trait::async_trait;
use quiz_core::model::raw::{raw_quiz_id, read_header};
use quiz_core::model::{QuizHeader, QuizId, QuizResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Stored shape of a quiz: header columns plus the raw JSON body as received.
///
/// The body is kept opaque; normalization happens when a session is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizRecord {
    pub header: QuizHeader,
    pub body: Value,
}

impl QuizRecord {
    /// Build a record from a raw quiz document, using its `id` field unless `id` is given.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the document has no usable id or is not
    /// a quiz object.
    pub fn from_json(id: Option<QuizId>, body: Value) -> Result<Self, StorageError> {
        let id = id
            .or_else(|| raw_quiz_id(&body))
            .ok_or_else(|| StorageError::Serialization("quiz document has no id".into()))?;
        let header =
            read_header(id, &body).map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self { header, body })
    }
}

/// Persisted result together with its storage row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: i64,
    pub result: QuizResult,
}

impl ResultRow {
    #[must_use]
    pub fn new(id: i64, result: QuizResult) -> Self {
        Self { id, result }
    }
}

/// Read side of the quiz data service.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch the header (title, entitlement flag) without the quiz body.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is unknown, or other storage errors.
    async fn quiz_header(&self, id: &QuizId) -> Result<QuizHeader, StorageError>;

    /// Fetch the raw quiz document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is unknown, or other storage errors.
    async fn fetch_quiz_by_id(&self, id: &QuizId) -> Result<Value, StorageError>;
}

/// Writable quiz store used by seeding and tests.
#[async_trait]
pub trait QuizRepository: QuizSource {
    /// Insert or replace a quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, record: &QuizRecord) -> Result<(), StorageError>;

    /// List quiz headers ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_quiz_headers(&self, limit: u32) -> Result<Vec<QuizHeader>, StorageError>;
}

/// Durable store for completed attempts.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a result and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError>;

    /// Fetch a result by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError>;

    /// Most recent results for a quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_result_rows(
        &self,
        quiz_id: &QuizId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, QuizRecord>>>,
    results: Arc<Mutex<Vec<QuizResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizSource for InMemoryRepository {
    async fn quiz_header(&self, id: &QuizId) -> Result<QuizHeader, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(id)
            .map(|r| r.header.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn fetch_quiz_by_id(&self, id: &QuizId) -> Result<Value, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(id)
            .map(|r| r.body.clone())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_quiz(&self, record: &QuizRecord) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.header.id.clone(), record.clone());
        Ok(())
    }

    async fn list_quiz_headers(&self, limit: u32) -> Result<Vec<QuizHeader>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut headers: Vec<_> = guard.values().map(|r| r.header.clone()).collect();
        headers.sort_by(|a, b| a.id.cmp(&b.id));
        headers.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(headers)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(result.clone());
        i64::try_from(guard.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn get_result(&self, id: i64) -> Result<QuizResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let index = usize::try_from(id - 1).map_err(|_| StorageError::NotFound)?;
        guard.get(index).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_result_rows(
        &self,
        quiz_id: &QuizId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows = Vec::new();
        for (index, result) in guard.iter().enumerate().rev() {
            if rows.len() >= limit {
                break;
            }
            if result.quiz_id() == quiz_id {
                let id = i64::try_from(index + 1)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                rows.push(ResultRow::new(id, result.clone()));
            }
        }
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub quiz_source: Arc<dyn QuizSource>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let quiz_source: Arc<dyn QuizSource> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self {
            quizzes,
            quiz_source,
            results,
        }
    }
}
