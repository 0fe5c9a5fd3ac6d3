mod question;
mod session;
mod stats;

pub use question::{AnswerOption, Question};
pub use session::{Phase, QuizSession, SessionError};
pub use stats::{QuestionOutcome, SessionProgress, SessionStatistics};
