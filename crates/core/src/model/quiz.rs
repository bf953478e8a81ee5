use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;

/// Duration applied when the source omits a usable one (20 minutes).
pub const DEFAULT_DURATION_SECS: u32 = 20 * 60;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural problems found while building a quiz definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz definition is not a JSON object")]
    NotAnObject,

    #[error("quiz definition could not be decoded: {0}")]
    Decode(String),

    #[error("quiz has no questions")]
    EmptyQuestions,

    #[error("quiz duration must be > 0 seconds")]
    InvalidDuration,

    #[error("question {question} has {len} options, at least 2 required")]
    TooFewOptions { question: QuestionId, len: usize },

    #[error("question {question} has correct index {index} but only {len} options")]
    CorrectIndexOutOfRange {
        question: QuestionId,
        index: usize,
        len: usize,
    },

    #[error("question {question} has no usable correct answer")]
    MissingCorrectAnswer { question: QuestionId },

    #[error("question {question} has an unusable option at position {position}")]
    InvalidOption { question: QuestionId, position: usize },

    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(QuestionId),

    #[error("question at position {0} has a blank id")]
    BlankQuestionId(usize),
}

//
// ─── HEADER ────────────────────────────────────────────────────────────────────
//

/// The part of a quiz needed before its body is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizHeader {
    pub id: QuizId,
    pub title: String,
    pub requires_entitlement: bool,
}

//
// ─── DEFINITION ────────────────────────────────────────────────────────────────
//

/// An immutable, validated quiz ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    id: QuizId,
    title: String,
    duration_secs: u32,
    requires_entitlement: bool,
    questions: Vec<Question>,
}

impl QuizDefinition {
    /// Build a quiz definition from already validated questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestions` if `questions` is empty,
    /// `QuizError::InvalidDuration` for a zero duration and
    /// `QuizError::DuplicateQuestionId` if two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        duration_secs: u32,
        requires_entitlement: bool,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyQuestions);
        }
        if duration_secs == 0 {
            return Err(QuizError::InvalidDuration);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestionId(question.id().clone()));
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            duration_secs,
            requires_entitlement,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn requires_entitlement(&self) -> bool {
        self.requires_entitlement
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn header(&self) -> QuizHeader {
        QuizHeader {
            id: self.id.clone(),
            title: self.title.clone(),
            requires_entitlement: self.requires_entitlement,
        }
    }
}
