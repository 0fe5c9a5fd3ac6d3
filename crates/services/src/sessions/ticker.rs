use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::workflow::{SharedSession, lock_session};

/// Drives `QuizSession::tick` once per period while the session is active.
///
/// The task ends on its own at the first tick that finds the session outside
/// `Active`; dropping the ticker aborts it.
#[derive(Debug)]
pub struct SessionTicker {
    handle: JoinHandle<()>,
}

impl SessionTicker {
    /// Spawn a one-second ticker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(session: SharedSession) -> Self {
        Self::spawn_with_period(session, Duration::from_secs(1))
    }

    /// Spawn a ticker with a custom period.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn_with_period(session: SharedSession, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let mut guard = lock_session(&session);
                if !guard.tick() {
                    log::debug!("ticker stopped; session is {}", guard.phase().as_str());
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Whether the ticking task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the ticking task.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for SessionTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Clock;
    use quiz_core::{AnswerOption, Phase, Question, QuizSession};
    use std::sync::{Arc, Mutex};

    fn shared_session(n: usize) -> SharedSession {
        let mut session = QuizSession::with_clock(Clock::default_clock());
        session
            .load_session(
                (0..n)
                    .map(|i| Question::new(format!("Q{i}"), vec![AnswerOption::correct("a")]))
                    .collect(),
            )
            .unwrap();
        Arc::new(Mutex::new(session))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second_on_current_question() {
        let session = shared_session(2);
        let ticker = SessionTicker::spawn(Arc::clone(&session));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(lock_session(&session).running_timer(), 3);

        lock_session(&session).submit_answer("a").unwrap();
        assert_eq!(lock_session(&session).running_timer(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        {
            let guard = lock_session(&session);
            assert_eq!(guard.running_timer(), 2);
            assert_eq!(guard.elapsed_per_question(), &[3]);
        }
        assert!(!ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_session_finishes() {
        let session = shared_session(1);
        let ticker = SessionTicker::spawn(Arc::clone(&session));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        lock_session(&session).submit_answer("a").unwrap();
        assert_eq!(lock_session(&session).phase(), Phase::Finished);

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(ticker.is_finished());
        assert_eq!(lock_session(&session).elapsed_per_question(), &[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_ticking() {
        let session = shared_session(1);
        let ticker = SessionTicker::spawn(Arc::clone(&session));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        ticker.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(lock_session(&session).running_timer(), 1);
    }
}
