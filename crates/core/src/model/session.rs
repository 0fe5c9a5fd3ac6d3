use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::stats::round_half_up;
use crate::model::{Question, QuestionOutcome, SessionProgress, SessionStatistics};
use crate::time::Clock;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot start a session without questions")]
    EmptyQuestionSet,

    #[error("no question is active")]
    NoActiveQuestion,

    #[error("session already finished")]
    SessionFinished,

    #[error("session is not finished yet")]
    NotFinished,
}

/// Coarse lifecycle stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Active,
    Finished,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Active => "active",
            Phase::Finished => "finished",
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State of one run through a fixed, ordered set of questions.
///
/// All fields change together through the lifecycle operations below so the
/// answer log, the per-question times and the position never disagree:
/// while `Active` or `Finished`, `answers().len() == elapsed_per_question().len()
/// == current_index()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizSession {
    clock: Clock,
    questions: Vec<Question>,
    current_index: usize,
    answers: Vec<String>,
    elapsed_per_question: Vec<u32>,
    running_timer: u32,
    phase: Phase,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// An empty `Idle` session using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty `Idle` session stamping start/finish with `clock`.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Seconds spent on the current question so far.
    #[must_use]
    pub fn running_timer(&self) -> u32 {
        self.running_timer
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Selected labels, indexed by question position.
    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn elapsed_per_question(&self) -> &[u32] {
        &self.elapsed_per_question
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Drop any previous state and mark the session as waiting for questions.
    pub fn begin_loading(&mut self) {
        self.reset();
        self.phase = Phase::Loading;
    }

    /// Return to `Idle` after a failed fetch. Has no effect outside `Loading`.
    pub fn abort_loading(&mut self) {
        if self.phase == Phase::Loading {
            self.reset();
        }
    }

    /// Start a session over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuestionSet` if `questions` is empty; the
    /// session is then left `Idle` with no state.
    pub fn load_session(&mut self, questions: Vec<Question>) -> Result<(), SessionError> {
        self.reset();
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }

        self.answers.reserve(questions.len());
        self.elapsed_per_question.reserve(questions.len());
        self.questions = questions;
        self.phase = Phase::Active;
        self.started_at = Some(self.clock.now());
        Ok(())
    }

    /// Count one second on the current question.
    ///
    /// Returns `false` and does nothing unless the session is `Active`.
    pub fn tick(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.running_timer = self.running_timer.saturating_add(1);
        true
    }

    /// Record `selected_label` for the current question and advance.
    ///
    /// The label is not checked against the question's options; anything other
    /// than the correct label scores as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionFinished` once every question is answered,
    /// and `SessionError::NoActiveQuestion` before a session is loaded.
    pub fn submit_answer(&mut self, selected_label: impl Into<String>) -> Result<(), SessionError> {
        match self.phase {
            Phase::Active => {}
            Phase::Finished => return Err(SessionError::SessionFinished),
            Phase::Idle | Phase::Loading => return Err(SessionError::NoActiveQuestion),
        }

        self.answers.push(selected_label.into());
        self.elapsed_per_question.push(self.running_timer);

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.running_timer = 0;
        } else {
            self.current_index = self.questions.len();
            self.phase = Phase::Finished;
            self.completed_at = Some(self.clock.now());
        }
        Ok(())
    }

    /// The question awaiting an answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveQuestion` unless the session is `Active`.
    pub fn current_question(&self) -> Result<&Question, SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NoActiveQuestion);
        }
        self.questions
            .get(self.current_index)
            .ok_or(SessionError::NoActiveQuestion)
    }

    /// Score and timing totals for a finished session.
    ///
    /// Percentages and averages are rounded half-up to whole numbers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` until the last answer is submitted.
    pub fn compute_statistics(&self) -> Result<SessionStatistics, SessionError> {
        if self.phase != Phase::Finished {
            return Err(SessionError::NotFinished);
        }

        let total = self.questions.len() as u64;
        let correct = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, answer)| q.is_correct_answer(answer))
            .count() as u64;
        let total_time: u64 = self.elapsed_per_question.iter().map(|&s| u64::from(s)).sum();

        Ok(SessionStatistics {
            total_questions: u32::try_from(total).unwrap_or(u32::MAX),
            correct_answers: u32::try_from(correct).unwrap_or(u32::MAX),
            percentage: u32::try_from(round_half_up(100 * correct, total)).unwrap_or(u32::MAX),
            total_time_seconds: total_time,
            average_time_seconds: round_half_up(total_time, total),
        })
    }

    /// Per-question review of a finished session, in question order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` until the last answer is submitted.
    pub fn question_outcomes(&self) -> Result<Vec<QuestionOutcome>, SessionError> {
        if self.phase != Phase::Finished {
            return Err(SessionError::NotFinished);
        }

        let outcomes = self
            .questions
            .iter()
            .zip(&self.answers)
            .zip(&self.elapsed_per_question)
            .enumerate()
            .map(|(index, ((question, selected), &elapsed))| QuestionOutcome {
                index,
                prompt: question.prompt().to_owned(),
                selected_label: selected.clone(),
                correct_label: question.correct_label().map(str::to_owned),
                is_correct: question.is_correct_answer(selected),
                elapsed_seconds: elapsed,
            })
            .collect();
        Ok(outcomes)
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        SessionProgress {
            total,
            answered: self.answers.len(),
            remaining: total.saturating_sub(self.current_index),
            is_complete: self.is_finished(),
            percent_complete: u32::try_from(round_half_up(
                100 * self.current_index as u64,
                total as u64,
            ))
            .unwrap_or(100),
        }
    }

    /// Back to the empty `Idle` state. Always succeeds.
    pub fn restart(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::with_clock(self.clock);
    }
}
