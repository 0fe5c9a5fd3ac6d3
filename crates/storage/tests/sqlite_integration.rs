use quiz_core::{AnswerOption, Question};
use storage::repository::{QuestionRepository, QuestionSource, Storage};
use storage::sqlite::SqliteRepository;

fn question(prompt: &str, correct: &str, wrong: &[&str]) -> Question {
    let mut options = vec![AnswerOption::correct(correct)];
    options.extend(wrong.iter().map(|w| AnswerOption::incorrect(*w)));
    Question::new(prompt, options)
}

async fn open(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    SqliteRepository::open_question_bank(&url)
        .await
        .expect("open question bank")
}

#[tokio::test]
async fn sqlite_roundtrips_questions_with_ordered_options() {
    let repo = open("memdb_roundtrip").await;

    let first = Question::new(
        "2+2?",
        vec![
            AnswerOption::incorrect("3"),
            AnswerOption::correct("4"),
            AnswerOption::incorrect("5"),
        ],
    );
    let second = question("Capital of France?", "Paris", &["Rome", "Madrid"]);
    repo.insert_question(&first).await.unwrap();
    repo.insert_question(&second).await.unwrap();

    let fetched = repo.fetch_questions(10).await.expect("fetch");
    assert_eq!(fetched, vec![first, second]);
    assert_eq!(fetched[0].correct_label(), Some("4"));
}

#[tokio::test]
async fn sqlite_fetch_respects_limit_and_insert_order() {
    let repo = open("memdb_limit").await;
    for i in 0..12 {
        repo.insert_question(&question(&format!("Q{i}"), "a", &["b"]))
            .await
            .unwrap();
    }

    assert_eq!(repo.count_questions().await.unwrap(), 12);
    let fetched = repo.fetch_questions(10).await.unwrap();
    assert_eq!(fetched.len(), 10);
    assert_eq!(fetched[0].prompt(), "Q0");
    assert_eq!(fetched[9].prompt(), "Q9");
}

#[tokio::test]
async fn sqlite_empty_bank_returns_no_questions() {
    let repo = open("memdb_empty").await;
    assert!(repo.fetch_questions(10).await.unwrap().is_empty());
    assert_eq!(repo.count_questions().await.unwrap(), 0);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = open("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.insert_question(&question("?", "y", &["n"])).await.unwrap();
    assert_eq!(repo.count_questions().await.unwrap(), 1);
}

#[tokio::test]
async fn storage_sqlite_wires_both_handles() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage
        .questions
        .insert_question(&question("Largest planet?", "Jupiter", &["Mars"]))
        .await
        .unwrap();

    let fetched = storage.source.fetch_questions(1).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].correct_label(), Some("Jupiter"));
}

#[tokio::test]
async fn sqlite_fetch_with_limit_beyond_parameter_cap() {
    let repo = open("memdb_large_limit").await;
    for i in 0..1_200 {
        repo.insert_question(&question(&format!("Q{i}"), &format!("A{i}"), &["x"]))
            .await
            .unwrap();
    }

    let fetched = repo.fetch_questions(100_000).await.expect("fetch");
    assert_eq!(fetched.len(), 1_200);
    assert_eq!(fetched[1_199].prompt(), "Q1199");
    assert_eq!(fetched[1_199].correct_label(), Some("A1199"));
    assert!(fetched.iter().all(|q| q.options().len() == 2));
}
