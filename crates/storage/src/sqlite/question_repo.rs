use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use quiz_core::{AnswerOption, Question};
use sqlx::Row;

use super::mapping::{conn, map_option_row, ser, u64_from_i64};
use super::{SqliteInitError, SqliteRepository};
use crate::repository::{QuestionRepository, QuestionSource, Storage, StorageError};

impl SqliteRepository {
    /// Connect and bring the question bank schema up to date.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection or a migration fails.
    pub async fn open_question_bank(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }
}

impl Storage {
    /// Build a `Storage` whose questions live in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::open_question_bank(database_url).await?;
        let source: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo);
        Ok(Self { source, questions })
    }
}

#[async_trait::async_trait]
impl QuestionSource for SqliteRepository {
    async fn fetch_questions(&self, limit: u32) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, prompt
            FROM quiz_questions
            ORDER BY position ASC, id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut heads = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            let prompt: String = row.try_get("prompt").map_err(ser)?;
            heads.push((id, prompt));
        }

        // Same selection as above, so the option query needs a single parameter.
        let option_rows = sqlx::query(
            r"
            SELECT question_id, label, is_correct
            FROM quiz_options
            WHERE question_id IN (
                SELECT id FROM quiz_questions
                ORDER BY position ASC, id ASC
                LIMIT ?1
            )
            ORDER BY question_id ASC, position ASC
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut options: HashMap<i64, Vec<AnswerOption>> = HashMap::with_capacity(heads.len());
        for row in &option_rows {
            let (question_id, option) = map_option_row(row)?;
            options.entry(question_id).or_default().push(option);
        }

        Ok(heads
            .into_iter()
            .map(|(id, prompt)| Question::new(prompt, options.remove(&id).unwrap_or_default()))
            .collect())
    }
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(&self, question: &Question) -> Result<i64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO quiz_questions (prompt, position, created_at)
            VALUES (
                ?1,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM quiz_questions),
                ?2
            )
            ",
        )
        .bind(question.prompt())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let question_id = res.last_insert_rowid();

        for (position, option) in question.options().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("option position overflow".into()))?;
            sqlx::query(
                r"
                INSERT INTO quiz_options (question_id, position, label, is_correct)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(question_id)
            .bind(position)
            .bind(option.label())
            .bind(option.is_correct())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(question_id)
    }

    async fn count_questions(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM quiz_questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u64_from_i64("count", row.try_get::<i64, _>("n").map_err(ser)?)
    }
}
