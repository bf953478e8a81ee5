use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::raw::normalize_quiz;
use quiz_core::model::{QuizDefinition, QuizId};
use storage::repository::QuizSource;

use crate::config::EngineConfig;
use crate::entitlement::EntitlementProvider;
use crate::error::SessionError;

/// Resolves a quiz id into a validated definition.
///
/// Order of checks: id, entitlement from the header, then the full fetch. The body
/// is never requested for a premium quiz the user cannot open.
#[derive(Clone)]
pub struct SessionLoader {
    source: Arc<dyn QuizSource>,
    entitlements: Arc<dyn EntitlementProvider>,
    slow_after: Duration,
    default_duration_secs: u32,
}

impl SessionLoader {
    #[must_use]
    pub fn new(
        source: Arc<dyn QuizSource>,
        entitlements: Arc<dyn EntitlementProvider>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            source,
            entitlements,
            slow_after: config.slow_load_after(),
            default_duration_secs: config.default_duration_secs(),
        }
    }

    /// Loads without progress reporting.
    ///
    /// # Errors
    ///
    /// See [`SessionLoader::load_with_progress`].
    pub async fn load(&self, quiz_id: &str) -> Result<QuizDefinition, SessionError> {
        self.load_with_progress(quiz_id, || {}).await
    }

    /// Loads a quiz, calling `on_slow` once if loading (header, entitlement and body)
    /// is still pending after the configured threshold. Nothing is cancelled or restarted.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidQuizId` for a blank id
    /// - `SessionError::NotEntitled` for a premium quiz without entitlement
    /// - `SessionError::NotFound` / `Unavailable` for source failures
    /// - `SessionError::Malformed` when the document cannot be normalized
    pub async fn load_with_progress<F>(
        &self,
        quiz_id: &str,
        on_slow: F,
    ) -> Result<QuizDefinition, SessionError>
    where
        F: FnOnce() + Send,
    {
        let quiz_id =
            QuizId::new(quiz_id).map_err(|_| SessionError::InvalidQuizId(quiz_id.to_owned()))?;

        let resolve = self.resolve(&quiz_id);
        tokio::pin!(resolve);
        let slow = tokio::time::sleep(self.slow_after);
        tokio::pin!(slow);

        let mut on_slow = Some(on_slow);
        let quiz = loop {
            tokio::select! {
                res = &mut resolve => break res?,
                () = &mut slow, if on_slow.is_some() => {
                    tracing::info!(quiz_id = %quiz_id, after = ?self.slow_after, "quiz load is slow");
                    if let Some(notify) = on_slow.take() {
                        notify();
                    }
                }
            }
        };

        tracing::debug!(
            quiz_id = %quiz_id,
            questions = quiz.total(),
            duration_secs = quiz.duration_secs(),
            "quiz loaded"
        );
        Ok(quiz)
    }

    // Header, entitlement, body, normalization. The slow threshold spans all of it.
    async fn resolve(&self, quiz_id: &QuizId) -> Result<QuizDefinition, SessionError> {
        let header = self
            .source
            .quiz_header(quiz_id)
            .await
            .map_err(|e| SessionError::from_source(quiz_id, e))?;
        if header.requires_entitlement {
            self.ensure_entitled(quiz_id).await?;
        }

        let body = self
            .source
            .fetch_quiz_by_id(quiz_id)
            .await
            .map_err(|e| SessionError::from_source(quiz_id, e))?;

        let quiz = normalize_quiz(quiz_id.clone(), &body, self.default_duration_secs).map_err(
            |e| SessionError::Malformed {
                quiz_id: quiz_id.clone(),
                reason: e.to_string(),
            },
        )?;

        // The header can lag behind the body; a premium body is checked again.
        if quiz.requires_entitlement() && !header.requires_entitlement {
            self.ensure_entitled(quiz_id).await?;
        }
        Ok(quiz)
    }

    async fn ensure_entitled(&self, quiz_id: &QuizId) -> Result<(), SessionError> {
        if self.entitlements.premium_active().await {
            Ok(())
        } else {
            tracing::info!(quiz_id = %quiz_id, "premium quiz blocked");
            Err(SessionError::NotEntitled(quiz_id.clone()))
        }
    }
}
