//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `GeneratedQuestionSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("question generator is not configured")]
    Disabled,
    #[error("question generator returned an empty response")]
    EmptyResponse,
    #[error("question generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("could not parse generated questions: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("question source returned no questions")]
    Empty,
    #[error("session was reset while questions were loading")]
    Cancelled,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Source(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<GeneratorError> for StorageError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::Parse(e) => StorageError::Serialization(e.to_string()),
            other => StorageError::Unavailable(other.to_string()),
        }
    }
}
