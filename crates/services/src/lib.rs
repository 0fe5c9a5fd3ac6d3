#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod generator;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::{AppServices, QuizOptions, SourceKind};
pub use error::{AppServicesError, GeneratorError, QuizServiceError};
pub use generator::{GeneratedQuestionSource, GeneratorConfig};
pub use sessions::{
    AnswerResult, DEFAULT_BATCH_SIZE, QuizLoopService, QuizResults, SessionTicker, SharedSession,
    lock_session,
};
