use quiz_core::{QuestionOutcome, QuizSession, SessionStatistics};

use crate::error::QuizServiceError;

/// Presentation-agnostic results of a finished session.
///
/// Holds raw numbers only; callers format times (see `quiz_core::format_elapsed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResults {
    pub statistics: SessionStatistics,
    pub outcomes: Vec<QuestionOutcome>,
}

impl QuizResults {
    /// Collect statistics and the per-question review from a finished session.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` if the session is not finished.
    pub fn from_session(session: &QuizSession) -> Result<Self, QuizServiceError> {
        Ok(Self {
            statistics: session.compute_statistics()?,
            outcomes: session.question_outcomes()?,
        })
    }

    /// Outcomes answered incorrectly, in question order.
    pub fn missed(&self) -> impl Iterator<Item = &QuestionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::{AnswerOption, Question, SessionError};

    #[test]
    fn results_require_finished_session() {
        let session = QuizSession::new();
        let err = QuizResults::from_session(&session).unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Session(SessionError::NotFinished)
        ));
    }

    #[test]
    fn missed_lists_wrong_answers_with_correct_label() {
        let mut session = QuizSession::new();
        session
            .load_session(vec![
                Question::new("a?", vec![AnswerOption::correct("a")]),
                Question::new(
                    "b?",
                    vec![AnswerOption::incorrect("x"), AnswerOption::correct("b")],
                ),
            ])
            .unwrap();
        session.submit_answer("a").unwrap();
        session.tick();
        session.submit_answer("x").unwrap();

        let results = QuizResults::from_session(&session).unwrap();
        assert_eq!(results.statistics.correct_answers, 1);

        let missed: Vec<_> = results.missed().collect();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].index, 1);
        assert_eq!(missed[0].correct_label.as_deref(), Some("b"));
        assert_eq!(missed[0].elapsed_seconds, 1);
    }
}
