use async_trait::async_trait;
use quiz_core::Question;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("question source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can hand out a batch of questions for a session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch at most `limit` questions, in a stable order.
    ///
    /// An empty result is not an error here; callers decide whether it is usable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached or returns malformed rows.
    async fn fetch_questions(&self, limit: u32) -> Result<Vec<Question>, StorageError>;
}

/// Writable question bank, used for seeding.
#[async_trait]
pub trait QuestionRepository: QuestionSource {
    /// Append a question after the existing ones and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(&self, question: &Question) -> Result<i64, StorageError>;

    /// Number of stored questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn count_questions(&self) -> Result<u64, StorageError>;
}

/// Simple in-memory question bank for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Arc<Mutex<Vec<Question>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Make subsequent fetches fail with `StorageError::Unavailable` (or succeed again with `None`).
    pub fn set_failure(&self, message: Option<String>) {
        if let Ok(mut guard) = self.failure.lock() {
            *guard = message;
        }
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionBank {
    async fn fetch_questions(&self, limit: u32) -> Result<Vec<Question>, StorageError> {
        let failure = self
            .failure
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .clone();
        if let Some(message) = failure {
            return Err(StorageError::Unavailable(message));
        }

        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard.iter().take(take).cloned().collect())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionBank {
    async fn insert_question(&self, question: &Question) -> Result<i64, StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(question.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("id overflow".into()))
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len() as u64)
    }
}

/// Question bank behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub source: Arc<dyn QuestionSource>,
    pub questions: Arc<dyn QuestionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryQuestionBank::new();
        let source: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Self { source, questions }
    }
}
