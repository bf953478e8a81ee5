use quiz_core::model::{QuizHeader, QuizId, QuizResult, Score, SessionId, SubmitTrigger};
use sqlx::Row;

use crate::repository::{ResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn quiz_id_from_str(s: &str) -> Result<QuizId, StorageError> {
    QuizId::new(s).map_err(ser)
}

pub(crate) fn map_header_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizHeader, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let title: String = row.try_get("title").map_err(ser)?;
    let requires_entitlement: i64 = row.try_get("requires_entitlement").map_err(ser)?;
    Ok(QuizHeader {
        id: quiz_id_from_str(&id)?,
        title,
        requires_entitlement: requires_entitlement != 0,
    })
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResult, StorageError> {
    let quiz_id: String = row.try_get("quiz_id").map_err(ser)?;
    let session_id: String = row.try_get("session_id").map_err(ser)?;
    let trigger: String = row.try_get("submit_trigger").map_err(ser)?;

    let score = Score::from_parts(
        u32_from_i64("attempted", row.try_get::<i64, _>("attempted").map_err(ser)?)?,
        u32_from_i64("skipped", row.try_get::<i64, _>("skipped").map_err(ser)?)?,
        u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?,
        u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
        u32_from_i64("percentage", row.try_get::<i64, _>("percentage").map_err(ser)?)?,
    )
    .map_err(ser)?;

    Ok(QuizResult::new(
        quiz_id_from_str(&quiz_id)?,
        session_id.parse::<SessionId>().map_err(ser)?,
        score,
        SubmitTrigger::parse(&trigger).map_err(ser)?,
        row.try_get("submitted_at").map_err(ser)?,
    ))
}

pub(crate) fn map_result_row_with_id(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(ResultRow::new(id, map_result_row(row)?))
}
