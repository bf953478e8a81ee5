use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::QuizResult;
use storage::repository::ResultRepository;

use super::session::{AssessmentSession, Finalization, SessionTick};
use crate::error::SessionError;

/// Outcome of a finalized session as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub result: QuizResult,
    /// Row id of the stored result, if persistence succeeded.
    pub result_id: Option<i64>,
    /// `true` only for the call that actually finalized the session.
    pub fresh: bool,
    pub persisted: bool,
}

/// Serializes both submit triggers onto a session and hands the result to storage.
///
/// Owns the time source so that `submitted_at` is stamped in one place.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    clock: Clock,
    results: Arc<dyn ResultRepository>,
}

impl SubmissionCoordinator {
    #[must_use]
    pub fn new(clock: Clock, results: Arc<dyn ResultRepository>) -> Self {
        Self { clock, results }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Manual submission after the user confirmed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRunning` for a session that never started and
    /// `SessionError::Score` when scoring failed.
    pub async fn submit_manual(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<SubmitReceipt, SessionError> {
        let finalization = session.submit_manual(self.clock.now())?;
        Ok(self.hand_off(session, finalization).await)
    }

    /// Advances the countdown by one second; returns a receipt when it expired.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Score` when the automatic submission failed to score.
    pub async fn tick(
        &self,
        session: &mut AssessmentSession,
    ) -> Result<Option<SubmitReceipt>, SessionError> {
        match session.tick(self.clock.now()) {
            SessionTick::Ignored | SessionTick::Remaining(_) => Ok(None),
            SessionTick::Expired(finalization) => {
                let finalization = finalization?;
                Ok(Some(self.hand_off(session, finalization).await))
            }
        }
    }

    // Persists a fresh result exactly once. A storage failure leaves the session
    // completed and is kept on the session for display.
    async fn hand_off(
        &self,
        session: &mut AssessmentSession,
        finalization: Finalization,
    ) -> SubmitReceipt {
        let fresh = finalization.is_fresh();
        let result = match finalization {
            Finalization::Fresh(r) | Finalization::Previous(r) => r,
        };

        if fresh {
            match self.results.append_result(&result).await {
                Ok(id) => {
                    session.set_result_id(id);
                    tracing::info!(
                        session_id = %session.id(),
                        result_id = id,
                        "result stored"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        session_id = %session.id(),
                        error = %err,
                        "failed to store result"
                    );
                    session.set_persist_error(err.to_string());
                }
            }
        }

        SubmitReceipt {
            result,
            result_id: session.result_id(),
            fresh,
            persisted: session.result_id().is_some(),
        }
    }
}
