//! Study material lookup against an OpenAI-compatible chat completions API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::errors::{EnrichmentError, EnrichmentResult};
use crate::config::StudyConfig;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides study material for Jeopardy answers.";

/// Something that can produce study material for a missed answer
#[async_trait]
pub trait StudyMaterialSource: Send + Sync {
    async fn fetch(&self, answer_text: &str) -> EnrichmentResult<String>;
}

fn user_prompt(answer_text: &str) -> String {
    format!(
        "Provide study material for the Jeopardy answer: \"{}\". Include: 1) Key Points, \
         2) Related Topics, 3) Common Misconceptions, 4) Fun Fact, and 5) Study Tips.",
        answer_text
    )
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat completions client used for study material
pub struct OpenAiStudyClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenAiStudyClient {
    pub fn new(config: &StudyConfig) -> EnrichmentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl StudyMaterialSource for OpenAiStudyClient {
    async fn fetch(&self, answer_text: &str) -> EnrichmentResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            EnrichmentError::Configuration("OpenAI API key is not set".to_string())
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user_prompt(answer_text)),
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                EnrichmentError::InvalidResponse("response has no message content".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config(api_base: String, api_key: Option<&str>) -> StudyConfig {
        StudyConfig {
            api_key: api_key.map(str::to_string),
            api_base,
            ..StudyConfig::default()
        }
    }

    #[test]
    fn test_user_prompt_embeds_answer() {
        let prompt = user_prompt("Who is Abraham Lincoln?");
        assert!(prompt.contains("\"Who is Abraham Lincoln?\""));
        assert!(prompt.contains("1) Key Points"));
        assert!(prompt.contains("5) Study Tips"));
    }

    #[tokio::test]
    async fn test_fetch_returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 500,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "Key Points: ..." } },
                        { "message": { "role": "assistant", "content": "ignored" } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAiStudyClient::new(&config(server.url(), Some("test-key"))).unwrap();
        let material = client.fetch("Who is Abraham Lincoln?").await.unwrap();

        assert_eq!(material, "Key Points: ...");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_without_key_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = OpenAiStudyClient::new(&config(server.url(), None)).unwrap();
        let err = client.fetch("anything").await.unwrap_err();

        assert!(matches!(err, EnrichmentError::Configuration(_)));
        assert!(!err.is_retryable());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_reports_http_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let client = OpenAiStudyClient::new(&config(server.url(), Some("k"))).unwrap();
        let err = client.fetch("x").await.unwrap_err();

        assert_eq!(
            err,
            EnrichmentError::Http {
                status: 500,
                body: "upstream exploded".to_string()
            }
        );
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = OpenAiStudyClient::new(&config(server.url(), Some("k"))).unwrap();
        let err = client.fetch("x").await.unwrap_err();

        assert!(matches!(err, EnrichmentError::InvalidResponse(_)));
    }
}
