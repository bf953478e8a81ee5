use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuizId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("attempted ({attempted}) + skipped ({skipped}) does not match total ({total})")]
    CountMismatch {
        attempted: u32,
        skipped: u32,
        total: u32,
    },

    #[error("correct ({correct}) exceeds attempted ({attempted})")]
    TooManyCorrect { correct: u32, attempted: u32 },

    #[error("percentage must be in 0..=100, got {0}")]
    InvalidPercentage(u32),

    #[error("unknown submit trigger: {0}")]
    UnknownTrigger(String),
}

/// What caused an attempt to be finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitTrigger {
    /// The user confirmed a submission.
    Manual,
    /// The countdown reached zero.
    Expired,
}

impl SubmitTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitTrigger::Manual => "manual",
            SubmitTrigger::Expired => "expired",
        }
    }

    /// Parses the persisted representation.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::UnknownTrigger` for unrecognized values.
    pub fn parse(s: &str) -> Result<Self, ResultError> {
        match s {
            "manual" => Ok(Self::Manual),
            "expired" => Ok(Self::Expired),
            other => Err(ResultError::UnknownTrigger(other.to_owned())),
        }
    }
}

/// Counts produced by the scorer for one set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub attempted: u32,
    pub skipped: u32,
    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
}

impl Score {
    /// Validates a score coming from outside the scorer.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the counts are inconsistent.
    pub fn from_parts(
        attempted: u32,
        skipped: u32,
        correct: u32,
        total: u32,
        percentage: u32,
    ) -> Result<Self, ResultError> {
        if attempted.checked_add(skipped) != Some(total) {
            return Err(ResultError::CountMismatch {
                attempted,
                skipped,
                total,
            });
        }
        if correct > attempted {
            return Err(ResultError::TooManyCorrect { correct, attempted });
        }
        let percentage =
            u8::try_from(percentage).map_err(|_| ResultError::InvalidPercentage(percentage))?;
        if percentage > 100 {
            return Err(ResultError::InvalidPercentage(u32::from(percentage)));
        }

        Ok(Self {
            attempted,
            skipped,
            correct,
            total,
            percentage,
        })
    }
}

/// Final, immutable outcome of one completed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    quiz_id: QuizId,
    session_id: SessionId,
    score: Score,
    trigger: SubmitTrigger,
    submitted_at: DateTime<Utc>,
}

impl QuizResult {
    #[must_use]
    pub fn new(
        quiz_id: QuizId,
        session_id: SessionId,
        score: Score,
        trigger: SubmitTrigger,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            quiz_id,
            session_id,
            score,
            trigger,
            submitted_at,
        }
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn attempted(&self) -> u32 {
        self.score.attempted
    }

    #[must_use]
    pub fn skipped(&self) -> u32 {
        self.score.skipped
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.score.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.score.total
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.score.percentage
    }

    #[must_use]
    pub fn trigger(&self) -> SubmitTrigger {
        self.trigger
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}
