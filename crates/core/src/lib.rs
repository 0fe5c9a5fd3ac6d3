#![forbid(unsafe_code)]

pub mod model;
pub mod time;

pub use model::{
    AnswerOption, Phase, Question, QuestionOutcome, QuizSession, SessionError, SessionProgress,
    SessionStatistics,
};
pub use time::{Clock, format_elapsed};
