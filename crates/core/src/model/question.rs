use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::quiz::QuizError;

/// Minimum number of options a question must offer.
pub const MIN_OPTIONS: usize = 2;

/// A single multiple-choice question.
///
/// Options are fixed at load time; `correct_index` always points into them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_index: usize,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::TooFewOptions` when fewer than two options are given and
    /// `QuizError::CorrectIndexOutOfRange` when the answer key does not point at an option.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Result<Self, QuizError> {
        if options.len() < MIN_OPTIONS {
            return Err(QuizError::TooFewOptions {
                question: id,
                len: options.len(),
            });
        }
        if correct_index >= options.len() {
            return Err(QuizError::CorrectIndexOutOfRange {
                question: id,
                index: correct_index,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
            correct_index,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Returns true if `option_index` selects an existing option.
    #[must_use]
    pub fn has_option(&self, option_index: usize) -> bool {
        option_index < self.options.len()
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }
}
