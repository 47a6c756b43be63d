//! OpenAI-compatible client for the chat-completion and moderation endpoints.
//!
//! One synchronous call per operation. No retries, no explicit timeout, no
//! streaming; a slow endpoint blocks the current interaction.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_base: String,
    /// Supplied out-of-band via `OPENAI_API_KEY`; never serialized back.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub moderation_model: String,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            moderation_model: "omni-moderation-latest".to_string(),
            max_tokens: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Seam for the hosted model: one generate call, one moderation call.
/// Tests substitute a stub; production uses [`LlmClient`].
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;
    async fn moderate(&self, text: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self { client: Client::new(), config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn post<T: DeserializeOwned>(&self, url: String, request: &impl Serialize) -> Result<T> {
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                bail!("API error ({status}): {}", api_error.error.message);
            }
            bail!("request failed ({status}): {body}");
        }

        serde_json::from_str(&body).with_context(|| format!("unexpected response from {url}"))
    }
}

#[async_trait]
impl ModelEndpoint for LlmClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![Message::system(system), Message::user(prompt)],
            max_tokens: self.config.max_tokens,
        };
        let completion: ChatCompletionResponse =
            self.post(self.endpoint("/v1/chat/completions"), &request).await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no choices in completion response"))?;
        Ok(choice.message.content)
    }

    async fn moderate(&self, text: &str) -> Result<bool> {
        let request = ModerationRequest { model: &self.config.moderation_model, input: text };
        let moderation: ModerationResponse =
            self.post(self.endpoint("/v1/moderations"), &request).await?;
        let result = moderation
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no results in moderation response"))?;
        Ok(result.flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_construction_trims_trailing_slash() {
        let client = LlmClient::new(LlmConfig {
            api_base: "https://api.example.com/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            client.endpoint("/v1/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );

        let client = LlmClient::new(LlmConfig {
            api_base: "https://api.example.com".to_string(),
            ..Default::default()
        });
        assert_eq!(client.endpoint("/v1/moderations"), "https://api.example.com/v1/moderations");
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(Message::system("You are a helpful assistant.")).unwrap();
        assert_eq!(json["role"], "system");
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn moderation_response_parses_flagged_field() {
        let parsed: ModerationResponse =
            serde_json::from_str(r#"{"id":"m-1","results":[{"flagged":true}]}"#).unwrap();
        assert!(parsed.results[0].flagged);
    }
}
