use std::env;

use async_trait::async_trait;
use quiz_core::Question;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storage::repository::{QuestionSource, StorageError};

use crate::error::GeneratorError;

const DEFAULT_TOPIC: &str = "generative AI";

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub topic: String,
}

impl GeneratorConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("QUIZ_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("QUIZ_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let topic = env::var("QUIZ_AI_TOPIC").unwrap_or_else(|_| DEFAULT_TOPIC.into());
        Some(Self {
            base_url,
            api_key,
            model,
            topic,
        })
    }
}

/// Question source backed by an OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct GeneratedQuestionSource {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl GeneratedQuestionSource {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Ask the model for up to `limit` questions.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` when the source is disabled, the request fails,
    /// or the reply is empty or not a question list.
    pub async fn generate(&self, limit: u32) -> Result<Vec<Question>, GeneratorError> {
        let config = self.config.as_ref().ok_or(GeneratorError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(&config.topic, limit),
            }],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GeneratorError::EmptyResponse)?;

        let mut questions = parse_questions(&content)?;
        questions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        log::debug!("generated {} questions", questions.len());
        Ok(questions)
    }
}

#[async_trait]
impl QuestionSource for GeneratedQuestionSource {
    async fn fetch_questions(&self, limit: u32) -> Result<Vec<Question>, StorageError> {
        Ok(self.generate(limit).await?)
    }
}

fn build_prompt(topic: &str, limit: u32) -> String {
    format!(
        "Write {limit} multiple-choice trivia questions about {topic}. \
         Reply with only a JSON array. Each element must look like \
         {{\"question\": \"...\", \"options\": [{{\"text\": \"...\", \"correct\": true}}, ...]}} \
         with four options and exactly one marked correct."
    )
}

/// Parse a model reply into questions, tolerating a surrounding code fence.
pub(crate) fn parse_questions(content: &str) -> Result<Vec<Question>, GeneratorError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(body.trim())?)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"[
        {"question": "What does GPT stand for?", "options": [
            {"text": "Generative Pre-trained Transformer", "correct": "true"},
            {"text": "General Purpose Tool", "correct": "false"}
        ]}
    ]"#;

    #[test]
    fn parses_plain_json_reply() {
        let questions = parse_questions(REPLY).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].correct_label(),
            Some("Generative Pre-trained Transformer")
        );
    }

    #[test]
    fn parses_fenced_reply() {
        let fenced = format!("```json\n{REPLY}\n```");
        assert_eq!(parse_questions(&fenced).unwrap().len(), 1);
    }

    #[test]
    fn rejects_prose_reply() {
        let err = parse_questions("Sure! Here are some questions.").unwrap_err();
        assert!(matches!(err, GeneratorError::Parse(_)));
    }

    #[tokio::test]
    async fn disabled_source_maps_to_unavailable() {
        let source = GeneratedQuestionSource::new(None);
        assert!(!source.enabled());
        let err = source.fetch_questions(5).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
