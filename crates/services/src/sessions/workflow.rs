use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_core::{Phase, Question, QuizSession};
use rand::rng;
use rand::seq::SliceRandom;
use storage::repository::QuestionSource;

use crate::Clock;
use crate::error::QuizServiceError;

/// Number of questions requested per session unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// A session shared between the answering flow and the ticker task.
pub type SharedSession = Arc<Mutex<QuizSession>>;

/// Locks a shared session, recovering the state if a holder panicked.
pub fn lock_session(session: &Mutex<QuizSession>) -> MutexGuard<'_, QuizSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of answering the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub was_correct: bool,
    pub is_complete: bool,
    pub elapsed_seconds: u32,
}

/// Orchestrates fetching a batch of questions and driving a session through it.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    source: Arc<dyn QuestionSource>,
    limit: u32,
    shuffle: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, source: Arc<dyn QuestionSource>) -> Self {
        Self {
            clock,
            source,
            limit: DEFAULT_BATCH_SIZE,
            shuffle: false,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Shuffle the fetched batch before loading it.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn shuffles(&self) -> bool {
        self.shuffle
    }

    /// An idle session stamped with this service's clock.
    #[must_use]
    pub fn new_session(&self) -> QuizSession {
        QuizSession::with_clock(self.clock)
    }

    /// An idle session ready to be shared with a `SessionTicker`.
    #[must_use]
    pub fn new_shared_session(&self) -> SharedSession {
        Arc::new(Mutex::new(self.new_session()))
    }

    /// Fetch a batch and load it into `session`.
    ///
    /// On any failure the session ends up `Idle`, never partially loaded.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Source` if the fetch fails and
    /// `QuizServiceError::Empty` if it yields no questions.
    pub async fn start(&self, session: &mut QuizSession) -> Result<usize, QuizServiceError> {
        session.begin_loading();
        match self.fetch_batch().await {
            Ok(questions) => {
                let count = questions.len();
                session.load_session(questions)?;
                log::info!("loaded quiz session with {count} questions");
                Ok(count)
            }
            Err(err) => {
                session.abort_loading();
                Err(err)
            }
        }
    }

    /// Same as [`QuizLoopService::start`] for a session shared with a ticker.
    ///
    /// The lock is released while the fetch is in flight. If the session left
    /// `Loading` in the meantime (for example after a restart) the batch is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Source`, `QuizServiceError::Empty`, or
    /// `QuizServiceError::Cancelled` if the session was reset during the fetch.
    pub async fn start_shared(
        &self,
        session: &Mutex<QuizSession>,
    ) -> Result<usize, QuizServiceError> {
        lock_session(session).begin_loading();
        let fetched = self.fetch_batch().await;

        let mut guard = lock_session(session);
        if guard.phase() != Phase::Loading {
            log::debug!("discarding fetched batch; session is {}", guard.phase().as_str());
            return Err(QuizServiceError::Cancelled);
        }
        match fetched {
            Ok(questions) => {
                let count = questions.len();
                guard.load_session(questions)?;
                log::info!("loaded quiz session with {count} questions");
                Ok(count)
            }
            Err(err) => {
                guard.abort_loading();
                Err(err)
            }
        }
    }

    /// Record `label` for the current question and report how it scored.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Session` if no question is active or the
    /// session is already finished.
    pub fn answer(
        &self,
        session: &mut QuizSession,
        label: &str,
    ) -> Result<AnswerResult, QuizServiceError> {
        let was_correct = session
            .current_question()
            .is_ok_and(|q| q.is_correct_answer(label));
        session.submit_answer(label)?;
        let elapsed_seconds = session.elapsed_per_question().last().copied().unwrap_or(0);

        if session.is_finished() {
            let stats = session.compute_statistics()?;
            log::info!(
                "quiz finished: {}/{} correct ({}%), {}s total",
                stats.correct_answers,
                stats.total_questions,
                stats.percentage,
                stats.total_time_seconds
            );
        }

        Ok(AnswerResult {
            was_correct,
            is_complete: session.is_finished(),
            elapsed_seconds,
        })
    }

    /// Reset `session` to the idle state.
    pub fn restart(&self, session: &mut QuizSession) {
        log::debug!("restarting quiz session from {}", session.phase().as_str());
        session.restart();
    }

    async fn fetch_batch(&self) -> Result<Vec<Question>, QuizServiceError> {
        let mut questions = match self.source.fetch_questions(self.limit).await {
            Ok(questions) => questions,
            Err(err) => {
                log::warn!("failed to fetch questions: {err}");
                return Err(err.into());
            }
        };
        if questions.is_empty() {
            log::warn!("question source returned no questions");
            return Err(QuizServiceError::Empty);
        }

        questions.truncate(usize::try_from(self.limit).unwrap_or(usize::MAX));
        if self.shuffle {
            questions.shuffle(&mut rng());
        }
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::AnswerOption;
    use storage::repository::InMemoryQuestionBank;

    fn bank(n: usize) -> InMemoryQuestionBank {
        InMemoryQuestionBank::with_questions(
            (0..n)
                .map(|i| {
                    Question::new(
                        format!("Q{i}"),
                        vec![AnswerOption::correct("right"), AnswerOption::incorrect("wrong")],
                    )
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn start_loads_at_most_limit_questions() {
        let svc = QuizLoopService::new(Clock::default_clock(), Arc::new(bank(15)));
        let mut session = svc.new_session();

        let loaded = svc.start(&mut session).await.unwrap();
        assert_eq!(loaded, 10);
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.question_count(), 10);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_session_idle() {
        let source = bank(3);
        source.set_failure(Some("down".into()));
        let svc = QuizLoopService::new(Clock::default_clock(), Arc::new(source));
        let mut session = svc.new_session();

        let err = svc.start(&mut session).await.unwrap_err();
        assert!(matches!(err, QuizServiceError::Source(_)));
        assert_eq!(session, svc.new_session());
    }

    #[tokio::test]
    async fn empty_fetch_is_rejected() {
        let svc = QuizLoopService::new(Clock::default_clock(), Arc::new(bank(0)));
        let mut session = svc.new_session();

        let err = svc.start(&mut session).await.unwrap_err();
        assert!(matches!(err, QuizServiceError::Empty));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn shuffle_keeps_the_same_batch() {
        let svc = QuizLoopService::new(Clock::default_clock(), Arc::new(bank(6)))
            .with_limit(6)
            .with_shuffle(true);
        let mut session = svc.new_session();
        svc.start(&mut session).await.unwrap();

        let mut prompts: Vec<_> = session
            .questions()
            .iter()
            .map(|q| q.prompt().to_owned())
            .collect();
        prompts.sort();
        assert_eq!(prompts, ["Q0", "Q1", "Q2", "Q3", "Q4", "Q5"]);
    }

    #[tokio::test]
    async fn answer_reports_correctness_and_completion() {
        let svc = QuizLoopService::new(Clock::default_clock(), Arc::new(bank(2)));
        let mut session = svc.new_session();
        svc.start(&mut session).await.unwrap();

        session.tick();
        let first = svc.answer(&mut session, "right").unwrap();
        assert_eq!(
            first,
            AnswerResult {
                was_correct: true,
                is_complete: false,
                elapsed_seconds: 1,
            }
        );

        let second = svc.answer(&mut session, "wrong").unwrap();
        assert!(!second.was_correct);
        assert!(second.is_complete);

        let err = svc.answer(&mut session, "right").unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Session(quiz_core::SessionError::SessionFinished)
        ));
    }

    #[tokio::test]
    async fn start_shared_loads_and_restart_resets() {
        let svc = QuizLoopService::new(Clock::default_clock(), Arc::new(bank(2)));
        let shared = svc.new_shared_session();

        assert_eq!(svc.start_shared(&shared).await.unwrap(), 2);
        assert_eq!(lock_session(&shared).phase(), Phase::Active);

        svc.restart(&mut lock_session(&shared));
        assert_eq!(lock_session(&shared).phase(), Phase::Idle);
    }
}
