use std::env;

use async_trait::async_trait;
use quiz_core::model::raw::read_header;
use quiz_core::model::{QuizHeader, QuizId};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use storage::repository::{QuizSource, StorageError};

#[derive(Clone, Debug)]
pub struct QuizApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl QuizApiConfig {
    /// Reads `QUIZ_API_BASE_URL` (required) and `QUIZ_API_KEY` (optional).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("QUIZ_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Some(Self { base_url, api_key })
    }

    fn quiz_url(&self, id: &QuizId) -> String {
        format!("{}/quizzes/{}", self.base_url.trim_end_matches('/'), id)
    }

    fn header_url(&self, id: &QuizId) -> String {
        format!("{}/header", self.quiz_url(id))
    }
}

/// Quiz data service reached over HTTP.
///
/// `GET {base}/quizzes/{id}/header` returns the title and premium flag only;
/// `GET {base}/quizzes/{id}` returns the full raw quiz document.
#[derive(Clone)]
pub struct HttpQuizSource {
    client: Client,
    config: QuizApiConfig,
}

impl HttpQuizSource {
    #[must_use]
    pub fn new(config: QuizApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn get_json(&self, url: String) -> Result<Value, StorageError> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound),
            status if !status.is_success() => {
                return Err(StorageError::Connection(format!(
                    "quiz service returned status {status}"
                )));
            }
            _ => {}
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                StorageError::Serialization(e.to_string())
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        // Some deployments answer a missing quiz with `200 null`.
        if body.is_null() {
            return Err(StorageError::NotFound);
        }
        Ok(body)
    }
}

#[async_trait]
impl QuizSource for HttpQuizSource {
    async fn quiz_header(&self, id: &QuizId) -> Result<QuizHeader, StorageError> {
        let body = self.get_json(self.config.header_url(id)).await?;
        read_header(id.clone(), &body).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn fetch_quiz_by_id(&self, id: &QuizId) -> Result<Value, StorageError> {
        self.get_json(self.config.quiz_url(id)).await
    }
}
