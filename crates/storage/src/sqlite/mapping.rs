use quiz_core::AnswerOption;
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

/// Reads `(question_id, option)` from a `quiz_options` row.
pub(crate) fn map_option_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(i64, AnswerOption), StorageError> {
    let question_id: i64 = row.try_get("question_id").map_err(ser)?;
    let label: String = row.try_get("label").map_err(ser)?;
    let is_correct: bool = row.try_get("is_correct").map_err(ser)?;
    Ok((question_id, AnswerOption::new(label, is_correct)))
}
