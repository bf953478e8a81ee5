use std::collections::HashMap;

use crate::model::ids::QuestionId;

/// What the user has selected, keyed by question.
///
/// Absent keys are unanswered questions. Selections overwrite each other (last write wins)
/// and nothing here knows which option is correct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    selections: HashMap<QuestionId, usize>,
}

impl AnswerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option_index` for `question_id`, returning the previous selection.
    pub fn select(&mut self, question_id: QuestionId, option_index: usize) -> Option<usize> {
        self.selections.insert(question_id, option_index)
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<usize> {
        self.selections.get(question_id).copied()
    }

    #[must_use]
    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.selections.contains_key(question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.selections.len()
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.selections.keys()
    }
}
