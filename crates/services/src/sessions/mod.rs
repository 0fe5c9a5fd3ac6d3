mod ticker;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::QuizServiceError;
pub use ticker::SessionTicker;
pub use view::QuizResults;
pub use workflow::{
    AnswerResult, DEFAULT_BATCH_SIZE, QuizLoopService, SharedSession, lock_session,
};
