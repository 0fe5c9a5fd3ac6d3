use std::sync::Arc;

use storage::repository::{QuestionRepository, QuestionSource, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::generator::GeneratedQuestionSource;
use crate::sessions::{DEFAULT_BATCH_SIZE, QuizLoopService};

/// Where session questions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Sqlite,
    Generated,
}

impl SourceKind {
    #[must_use]
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "sqlite" | "db" => Some(Self::Sqlite),
            "generated" | "ai" => Some(Self::Generated),
            _ => None,
        }
    }
}

/// How each session's batch is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOptions {
    pub source: SourceKind,
    pub limit: u32,
    /// Present the fetched batch in random order.
    pub shuffle: bool,
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            limit: DEFAULT_BATCH_SIZE,
            shuffle: false,
        }
    }
}

/// Assembles app-facing services over one question bank.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    questions: Arc<dyn QuestionRepository>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, fetching from either the
    /// database or the generator.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        options: QuizOptions,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, options))
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, options: QuizOptions) -> Self {
        let fetch_from: Arc<dyn QuestionSource> = match options.source {
            SourceKind::Sqlite => storage.source,
            SourceKind::Generated => Arc::new(GeneratedQuestionSource::from_env()),
        };
        let quiz_loop = Arc::new(
            QuizLoopService::new(clock, fetch_from)
                .with_limit(options.limit)
                .with_shuffle(options.shuffle),
        );

        Self {
            quiz_loop,
            questions: storage.questions,
        }
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<dyn QuestionRepository> {
        Arc::clone(&self.questions)
    }
}
