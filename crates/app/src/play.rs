use std::fmt::Write as _;
use std::sync::Arc;

use quiz_core::{AnswerOption, Question, QuizSession, format_elapsed};
use services::{
    AppServices, QuizLoopService, QuizResults, SessionTicker, SharedSession, lock_session,
};
use storage::repository::{QuestionRepository, StorageError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

/// Play sessions until the user quits or stdin closes.
pub async fn run_quiz(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let quiz_loop = services.quiz_loop();
    let shared = quiz_loop.new_shared_session();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("Loading quiz...");
        if let Err(notice) = load_quiz(&quiz_loop, &shared).await {
            eprintln!("{notice}");
            println!("[r] retry, anything else quits");
            if chose_r(next_line(&mut input).await?.as_deref()) {
                continue;
            }
            return Ok(());
        }
        let ticker = SessionTicker::spawn(Arc::clone(&shared));

        loop {
            let prompt = {
                let session = lock_session(&shared);
                if !session.is_active() {
                    break;
                }
                render_question(&session)
            };
            print!("{prompt}");

            let Some(line) = next_line(&mut input).await? else {
                println!();
                return Ok(());
            };

            let mut session = lock_session(&shared);
            let Ok(question) = session.current_question() else {
                break;
            };
            let Some(label) = resolve_answer(question, &line) else {
                println!("Pick an option number or type an answer.");
                continue;
            };
            let result = quiz_loop.answer(&mut session, &label)?;
            println!(
                "{} ({})",
                if result.was_correct { "Correct!" } else { "Incorrect." },
                format_elapsed(u64::from(result.elapsed_seconds))
            );
        }
        ticker.stop();

        let results = QuizResults::from_session(&lock_session(&shared))?;
        print!("{}", render_results(&results));

        println!("[r] restart, anything else quits");
        if !chose_r(next_line(&mut input).await?.as_deref()) {
            return Ok(());
        }
        quiz_loop.restart(&mut lock_session(&shared));
    }
}

/// Start a session, turning a failed load into the notice shown to the user.
///
/// The session is left `Idle` on failure so the caller can offer a retry.
async fn load_quiz(
    quiz_loop: &QuizLoopService,
    shared: &SharedSession,
) -> Result<usize, String> {
    quiz_loop
        .start_shared(shared)
        .await
        .map_err(|err| format!("Failed to load questions. Please try again. ({err})"))
}

fn chose_r(line: Option<&str>) -> bool {
    line.is_some_and(|line| line.trim().eq_ignore_ascii_case("r"))
}

async fn next_line(input: &mut Input) -> std::io::Result<Option<String>> {
    use std::io::Write;
    std::io::stdout().flush()?;
    input.next_line().await
}

/// Map user input to an option label: a 1-based option number, or the text itself.
fn resolve_answer(question: &Question, input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(n) = input.parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| question.options().get(i)) {
            return Some(option.label().to_owned());
        }
    }
    Some(input.to_owned())
}

fn render_question(session: &QuizSession) -> String {
    let mut out = String::new();
    let Ok(question) = session.current_question() else {
        return out;
    };
    let progress = session.progress();
    let _ = writeln!(
        out,
        "\nQuestion {} of {}  [{}]  {}%",
        session.current_index() + 1,
        session.question_count(),
        format_elapsed(u64::from(session.running_timer())),
        progress.percent_complete
    );
    let _ = writeln!(out, "{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, option.label());
    }
    out.push_str("> ");
    out
}

fn render_results(results: &QuizResults) -> String {
    let stats = &results.statistics;
    let mut out = String::new();
    let _ = writeln!(out, "\nQuiz Results");
    let _ = writeln!(out, "  Accuracy rate:          {}%", stats.percentage);
    let _ = writeln!(
        out,
        "  Correct answers:        {}/{}",
        stats.correct_answers, stats.total_questions
    );
    let _ = writeln!(
        out,
        "  Avg. time per question: {}",
        format_elapsed(stats.average_time_seconds)
    );
    let _ = writeln!(out);

    for outcome in &results.outcomes {
        let mark = if outcome.is_correct { "✓" } else { "✗" };
        let _ = writeln!(out, "{mark} {}. {}", outcome.index + 1, outcome.prompt);
        let _ = writeln!(out, "    Your answer: {}", outcome.selected_label);
        if !outcome.is_correct {
            if let Some(correct) = &outcome.correct_label {
                let _ = writeln!(out, "    Correct answer: {correct}");
            }
        }
        let _ = writeln!(
            out,
            "    Time taken: {}",
            format_elapsed(u64::from(outcome.elapsed_seconds))
        );
    }
    out
}

fn sample_questions() -> Vec<Question> {
    let q = |prompt: &str, correct: &str, wrong: [&str; 3]| {
        let mut options: Vec<_> = wrong.iter().map(|w| AnswerOption::incorrect(*w)).collect();
        options.insert(1, AnswerOption::correct(correct));
        Question::new(prompt, options)
    };
    vec![
        q(
            "What does GPT stand for?",
            "Generative Pre-trained Transformer",
            ["General Purpose Translator", "Graph Processing Toolkit", "Guided Prompt Tuning"],
        ),
        q(
            "Which architecture introduced self-attention at scale?",
            "Transformer",
            ["LSTM", "Convolutional network", "Restricted Boltzmann machine"],
        ),
        q(
            "What is a token in a language model?",
            "A unit of text the model processes",
            ["A login credential", "A GPU kernel", "A training epoch"],
        ),
        q(
            "What does RAG stand for?",
            "Retrieval-Augmented Generation",
            ["Random Attention Graph", "Recurrent Adversarial Generator", "Ranked Answer Grading"],
        ),
        q(
            "Which setting makes sampling more random?",
            "Higher temperature",
            ["Lower temperature", "Smaller context window", "Fewer parameters"],
        ),
    ]
}

/// Insert the built-in sample set if the bank is empty; returns how many were added.
pub async fn seed_sample_questions(repo: &dyn QuestionRepository) -> Result<usize, StorageError> {
    if repo.count_questions().await? > 0 {
        log::info!("question bank already seeded");
        return Ok(0);
    }
    let questions = sample_questions();
    for question in &questions {
        repo.insert_question(question).await?;
    }
    Ok(questions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::Phase;
    use services::Clock;
    use storage::repository::{InMemoryQuestionBank, QuestionSource};

    fn question() -> Question {
        Question::new(
            "2+2?",
            vec![AnswerOption::correct("4"), AnswerOption::incorrect("5")],
        )
    }

    #[test]
    fn resolves_option_numbers_and_free_text() {
        let q = question();
        assert_eq!(resolve_answer(&q, "1").as_deref(), Some("4"));
        assert_eq!(resolve_answer(&q, " 2 ").as_deref(), Some("5"));
        assert_eq!(resolve_answer(&q, "9").as_deref(), Some("9"));
        assert_eq!(resolve_answer(&q, "four").as_deref(), Some("four"));
        assert_eq!(resolve_answer(&q, "   "), None);
    }

    #[test]
    fn renders_question_with_timer_and_options() {
        let mut session = QuizSession::new();
        session.load_session(vec![question(), question()]).unwrap();
        for _ in 0..65 {
            session.tick();
        }
        let out = render_question(&session);
        assert!(out.contains("Question 1 of 2  [1:05]  0%"));
        assert!(out.contains("  1. 4\n"));
        assert!(out.contains("  2. 5\n"));
    }

    #[test]
    fn renders_results_with_missed_answer() {
        let mut session = QuizSession::new();
        session.load_session(vec![question()]).unwrap();
        session.tick();
        session.submit_answer("5").unwrap();

        let out = render_results(&QuizResults::from_session(&session).unwrap());
        assert!(out.contains("Accuracy rate:          0%"));
        assert!(out.contains("Correct answers:        0/1"));
        assert!(out.contains("Your answer: 5"));
        assert!(out.contains("Correct answer: 4"));
        assert!(out.contains("Time taken: 0:01"));
    }

    #[test]
    fn only_r_chooses_again() {
        assert!(chose_r(Some("r")));
        assert!(chose_r(Some(" R \n")));
        assert!(!chose_r(Some("q")));
        assert!(!chose_r(Some("")));
        assert!(!chose_r(None));
    }

    #[tokio::test]
    async fn failed_load_gives_one_notice_and_allows_retry() {
        let bank = Arc::new(InMemoryQuestionBank::with_questions(vec![question()]));
        bank.set_failure(Some("connection refused".into()));
        let quiz_loop = QuizLoopService::new(Clock::default_clock(), bank.clone());
        let shared = quiz_loop.new_shared_session();

        let notice = load_quiz(&quiz_loop, &shared).await.unwrap_err();
        assert!(notice.starts_with("Failed to load questions. Please try again."));
        assert!(notice.contains("connection refused"));
        assert_eq!(lock_session(&shared).phase(), Phase::Idle);
        assert_eq!(lock_session(&shared).question_count(), 0);

        bank.set_failure(None);
        assert_eq!(load_quiz(&quiz_loop, &shared).await.unwrap(), 1);
        assert_eq!(lock_session(&shared).phase(), Phase::Active);
    }

    #[tokio::test]
    async fn seeding_only_fills_an_empty_bank() {
        let bank = InMemoryQuestionBank::new();
        let added = seed_sample_questions(&bank).await.unwrap();
        assert_eq!(added, sample_questions().len());
        assert_eq!(seed_sample_questions(&bank).await.unwrap(), 0);

        let fetched = bank.fetch_questions(10).await.unwrap();
        assert!(fetched.iter().all(|q| q.correct_label().is_some()));
    }
}
