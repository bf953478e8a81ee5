use std::sync::Arc;

use quiz_core::Clock;
use storage::repository::{QuizSource, ResultRepository};
use tokio::sync::watch;

use super::coordinator::SubmissionCoordinator;
use super::driver::SessionDriver;
use super::loader::SessionLoader;
use super::session::AssessmentSession;
use super::view::SessionSnapshot;
use crate::config::EngineConfig;
use crate::entitlement::EntitlementProvider;
use crate::error::SessionError;

/// Entry point for delivering timed assessments.
///
/// Hides the quiz source, entitlement check, clock and result store from callers.
#[derive(Clone)]
pub struct AssessmentEngine {
    config: EngineConfig,
    loader: SessionLoader,
    coordinator: SubmissionCoordinator,
}

impl AssessmentEngine {
    #[must_use]
    pub fn new(
        config: EngineConfig,
        clock: Clock,
        quiz_source: Arc<dyn QuizSource>,
        entitlements: Arc<dyn EntitlementProvider>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            loader: SessionLoader::new(quiz_source, entitlements, &config),
            coordinator: SubmissionCoordinator::new(clock, results),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads the quiz and returns a session in `Ready`.
    ///
    /// # Errors
    ///
    /// Returns the load errors of [`SessionLoader::load_with_progress`].
    pub async fn start_session(&self, quiz_id: &str) -> Result<AssessmentSession, SessionError> {
        self.start_session_with_progress(quiz_id, || {}).await
    }

    /// Like [`AssessmentEngine::start_session`], calling `on_slow` once if loading
    /// takes longer than the configured threshold.
    ///
    /// # Errors
    ///
    /// Returns the load errors of [`SessionLoader::load_with_progress`].
    pub async fn start_session_with_progress<F>(
        &self,
        quiz_id: &str,
        on_slow: F,
    ) -> Result<AssessmentSession, SessionError>
    where
        F: FnOnce() + Send,
    {
        let quiz = self.loader.load_with_progress(quiz_id, on_slow).await?;
        let session = AssessmentSession::new(quiz);
        tracing::info!(
            session_id = %session.id(),
            quiz_id = %session.quiz().id(),
            "session ready"
        );
        Ok(session)
    }

    #[must_use]
    pub fn coordinator(&self) -> &SubmissionCoordinator {
        &self.coordinator
    }

    /// Wraps a ready session in a driver using the configured tick period.
    #[must_use]
    pub fn driver(&self, session: AssessmentSession) -> (SessionDriver, watch::Receiver<SessionSnapshot>) {
        SessionDriver::new(session, self.coordinator.clone(), self.config.tick_period())
    }
}
