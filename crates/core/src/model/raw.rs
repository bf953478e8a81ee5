//! Question normalizer: turns raw quiz records from the data service into
//! a canonical [`QuizDefinition`].
//!
//! Raw records look like
//! `{ id, title, duration?, premium?, questions: [{ id?, question, options, correctIndex | answer }] }`
//! where `duration` is expressed in minutes.

use serde::Deserialize;
use serde_json::Value;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;
use crate::model::quiz::{QuizDefinition, QuizError, QuizHeader};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuiz {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default, alias = "premium", alias = "isPremium")]
    requires_entitlement: Option<bool>,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "text")]
    question: Option<String>,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default)]
    correct_index: Option<Value>,
    #[serde(default)]
    answer: Option<Value>,
}

/// Reads the header fields of a raw quiz without validating its questions.
///
/// # Errors
///
/// Returns `QuizError::NotAnObject` / `QuizError::Decode` if the record is not a quiz object.
pub fn read_header(id: QuizId, raw: &Value) -> Result<QuizHeader, QuizError> {
    let raw = decode(raw)?;
    Ok(QuizHeader {
        title: raw.title.unwrap_or_else(|| id.to_string()),
        id,
        requires_entitlement: raw.requires_entitlement.unwrap_or(false),
    })
}

/// Returns the `id` field of a raw quiz, if present and usable.
#[must_use]
pub fn raw_quiz_id(raw: &Value) -> Option<QuizId> {
    raw.get("id")
        .and_then(scalar_to_string)
        .and_then(|s| QuizId::new(s).ok())
}

/// Normalize a raw quiz record.
///
/// `id` is the identifier the quiz was requested under; it wins over any id in the body.
/// `default_duration_secs` is used when `duration` is absent, zero or not numeric.
///
/// # Errors
///
/// Returns `QuizError` when the record violates the quiz invariants.
pub fn normalize_quiz(
    id: QuizId,
    raw: &Value,
    default_duration_secs: u32,
) -> Result<QuizDefinition, QuizError> {
    let raw = decode(raw)?;
    let duration_secs = resolve_duration_secs(raw.duration.as_ref(), default_duration_secs);

    let mut questions = Vec::with_capacity(raw.questions.len());
    for (ordinal, question) in raw.questions.into_iter().enumerate() {
        questions.push(normalize_question(ordinal, question)?);
    }

    let title = raw.title.unwrap_or_else(|| id.to_string());
    QuizDefinition::new(
        id,
        title,
        duration_secs,
        raw.requires_entitlement.unwrap_or(false),
        questions,
    )
}

/// Converts the minutes field into seconds, falling back to `default_secs`.
#[must_use]
pub fn resolve_duration_secs(minutes: Option<&Value>, default_secs: u32) -> u32 {
    let minutes = match minutes {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match minutes {
        Some(m) if m.is_finite() && m > 0.0 => {
            let secs = (m * 60.0).round();
            if secs < 1.0 {
                1
            } else if secs >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let secs = secs as u32;
                secs
            }
        }
        _ => default_secs,
    }
}

fn decode(raw: &Value) -> Result<RawQuiz, QuizError> {
    if !raw.is_object() {
        return Err(QuizError::NotAnObject);
    }
    RawQuiz::deserialize(raw).map_err(|e| QuizError::Decode(e.to_string()))
}

fn normalize_question(ordinal: usize, raw: RawQuestion) -> Result<Question, QuizError> {
    let id = match raw.id.as_ref().and_then(scalar_to_string) {
        Some(s) => QuestionId::new(s).map_err(|_| QuizError::BlankQuestionId(ordinal))?,
        None => QuestionId::from_ordinal(ordinal),
    };

    let mut options = Vec::with_capacity(raw.options.len());
    for (position, option) in raw.options.iter().enumerate() {
        let text = scalar_to_string(option).ok_or_else(|| QuizError::InvalidOption {
            question: id.clone(),
            position,
        })?;
        options.push(text);
    }

    let correct_index = raw
        .correct_index
        .as_ref()
        .and_then(coerce_index)
        .or_else(|| raw.answer.as_ref().and_then(|a| answer_to_index(a, &options)));

    let Some(correct_index) = correct_index else {
        if options.len() < crate::model::question::MIN_OPTIONS {
            return Err(QuizError::TooFewOptions {
                question: id,
                len: options.len(),
            });
        }
        return Err(QuizError::MissingCorrectAnswer { question: id });
    };

    Question::new(id, raw.question.unwrap_or_default(), options, correct_index)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let v = f as u64;
                        v
                    })
            })
            .and_then(|v| usize::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

// `answer` may be the index itself or the text of the correct option.
fn answer_to_index(answer: &Value, options: &[String]) -> Option<usize> {
    if let Some(index) = coerce_index(answer) {
        return Some(index);
    }
    let text = answer.as_str()?.trim();
    options.iter().position(|o| o.trim() == text)
}
