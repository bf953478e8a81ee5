use std::sync::Arc;

use quiz_core::Clock;
use storage::repository::{QuizSource, Storage};

use crate::assessment::AssessmentEngine;
use crate::config::EngineConfig;
use crate::entitlement::EntitlementProvider;
use crate::error::AppServicesError;
use crate::history::ResultHistoryService;
use crate::quiz_api::{HttpQuizSource, QuizApiConfig};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    engine: Arc<AssessmentEngine>,
    history: Arc<ResultHistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Quizzes come from the remote service when `quiz_api` is given and from the
    /// local `quizzes` table otherwise; results are always stored locally.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: EngineConfig,
        entitlements: Arc<dyn EntitlementProvider>,
        quiz_api: Option<QuizApiConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            &storage,
            clock,
            config,
            entitlements,
            quiz_api,
        ))
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(
        clock: Clock,
        config: EngineConfig,
        entitlements: Arc<dyn EntitlementProvider>,
    ) -> (Self, Storage) {
        let storage = Storage::in_memory();
        let services = Self::from_storage(&storage, clock, config, entitlements, None);
        (services, storage)
    }

    fn from_storage(
        storage: &Storage,
        clock: Clock,
        config: EngineConfig,
        entitlements: Arc<dyn EntitlementProvider>,
        quiz_api: Option<QuizApiConfig>,
    ) -> Self {
        let quiz_source: Arc<dyn QuizSource> = match quiz_api {
            Some(api) => {
                tracing::info!(base_url = %api.base_url, "using remote quiz service");
                Arc::new(HttpQuizSource::new(api))
            }
            None => Arc::clone(&storage.quiz_source),
        };

        let engine = Arc::new(AssessmentEngine::new(
            config,
            clock,
            quiz_source,
            entitlements,
            Arc::clone(&storage.results),
        ));
        let history = Arc::new(ResultHistoryService::new(
            clock,
            Arc::clone(&storage.results),
        ));
        Self { engine, history }
    }

    #[must_use]
    pub fn engine(&self) -> Arc<AssessmentEngine> {
        Arc::clone(&self.engine)
    }

    #[must_use]
    pub fn history(&self) -> Arc<ResultHistoryService> {
        Arc::clone(&self.history)
    }
}
