use thiserror::Error;

use crate::model::{AnswerStore, QuestionId, QuizDefinition, Score};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("too many questions to score: {len}")]
    TooManyQuestions { len: usize },

    #[error("answer recorded for unknown question {0}")]
    UnknownQuestion(QuestionId),
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// Score a set of answers against a quiz's answer key.
///
/// Unanswered and wrongly answered questions both contribute zero. The percentage is
/// rounded half-up. Pure: the same inputs always produce the same `Score`.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{AnswerStore, Question, QuestionId, QuizDefinition, QuizId};
/// # use quiz_core::scorer::score;
/// let q = |id: &str, key| {
///     Question::new(QuestionId::new(id).unwrap(), id, vec!["a".into(), "b".into()], key).unwrap()
/// };
/// let quiz = QuizDefinition::new(QuizId::new("demo").unwrap(), "Demo", 60, false, vec![q("x", 0), q("y", 1)]).unwrap();
/// let mut answers = AnswerStore::new();
/// answers.select(QuestionId::new("x").unwrap(), 0);
/// let s = score(&quiz, &answers).unwrap();
/// assert_eq!((s.correct, s.skipped, s.percentage), (1, 1, 50));
/// ```
///
/// # Errors
///
/// Returns `ScoreError::UnknownQuestion` if `answers` holds a key that is not part of the quiz,
/// and `ScoreError::TooManyQuestions` if counts cannot be represented.
pub fn score(quiz: &QuizDefinition, answers: &AnswerStore) -> Result<Score, ScoreError> {
    if let Some(unknown) = answers.question_ids().find(|id| quiz.question(id).is_none()) {
        return Err(ScoreError::UnknownQuestion(unknown.clone()));
    }

    let len = quiz.total();
    let total = u32::try_from(len).map_err(|_| ScoreError::TooManyQuestions { len })?;
    let attempted = u32::try_from(answers.answered_count())
        .map_err(|_| ScoreError::TooManyQuestions { len })?;

    let mut correct = 0_u32;
    for question in quiz.questions() {
        if answers
            .get(question.id())
            .is_some_and(|selected| question.is_correct(selected))
        {
            correct = correct.saturating_add(1);
        }
    }

    Ok(Score {
        attempted,
        skipped: total.saturating_sub(attempted),
        correct,
        total,
        percentage: percentage(correct, total),
    })
}

/// `round(correct / total * 100)` with halves rounded up; 0 when `total` is 0.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let pct = (correct * 200 + total) / (total * 2);
    u8::try_from(pct).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuizId};

    fn quiz_with_keys(keys: &[usize]) -> QuizDefinition {
        let questions = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                Question::new(
                    QuestionId::from_ordinal(i),
                    format!("Q{i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    *key,
                )
                .unwrap()
            })
            .collect();
        QuizDefinition::new(QuizId::new("quiz").unwrap(), "Quiz", 60, false, questions).unwrap()
    }

    fn qid(n: usize) -> QuestionId {
        QuestionId::from_ordinal(n)
    }

    #[test]
    fn mixed_answers_score_one_of_three() {
        let quiz = quiz_with_keys(&[1, 0, 2]);
        let mut answers = AnswerStore::new();
        answers.select(qid(0), 1);
        answers.select(qid(1), 1);

        let s = score(&quiz, &answers).unwrap();
        assert_eq!(s.total, 3);
        assert_eq!(s.attempted, 2);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.correct, 1);
        assert_eq!(s.percentage, 33);
    }

    #[test]
    fn no_answers_scores_zero() {
        let quiz = quiz_with_keys(&[0, 0]);
        let s = score(&quiz, &AnswerStore::new()).unwrap();
        assert_eq!((s.attempted, s.skipped, s.correct, s.percentage), (0, 2, 0, 0));
    }

    #[test]
    fn scoring_is_pure() {
        let quiz = quiz_with_keys(&[2, 1, 0, 0]);
        let mut answers = AnswerStore::new();
        answers.select(qid(0), 2);
        answers.select(qid(3), 1);
        assert_eq!(score(&quiz, &answers), score(&quiz, &answers));
    }

    #[test]
    fn attempted_plus_skipped_is_total_for_any_selection_sequence() {
        let quiz = quiz_with_keys(&[0, 1, 2, 0, 1]);
        let mut answers = AnswerStore::new();
        let picks = [(0, 1), (3, 2), (0, 0), (4, 1), (3, 0), (1, 2)];
        for (q, opt) in picks {
            answers.select(qid(q), opt);
            let s = score(&quiz, &answers).unwrap();
            assert_eq!(s.attempted + s.skipped, s.total);
        }
    }

    #[test]
    fn unknown_answer_key_is_rejected() {
        let quiz = quiz_with_keys(&[0]);
        let mut answers = AnswerStore::new();
        answers.select(QuestionId::new("stray").unwrap(), 0);
        assert!(matches!(
            score(&quiz, &answers),
            Err(ScoreError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 200), 1);
        assert_eq!(percentage(1, 201), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }
}
