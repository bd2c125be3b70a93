use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The external reasoning service: one prompt in, one text reply out.
///
/// The orchestrator never assumes the reply is valid structured data;
/// implementations just hand back whatever text the service produced.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Client for a locally hosted generation endpoint
/// (`POST {prompt, max_new_tokens}` -> `{response}`).
pub struct LocalLlmClient {
    endpoint: String,
    max_new_tokens: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    max_new_tokens: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl LocalLlmClient {
    pub fn new(endpoint: impl Into<String>, max_new_tokens: usize) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            max_new_tokens,
            client,
        })
    }
}

#[async_trait]
impl ReasoningClient for LocalLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest {
                prompt,
                max_new_tokens: self.max_new_tokens,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        parsed
            .response
            .ok_or_else(|| ServiceError::MalformedReply("reply is missing 'response'".to_string()))
    }
}

/// Client for an OpenAI-style chat completions endpoint
pub struct ChatClient {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl ChatClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            client,
        })
    }
}

#[async_trait]
impl ReasoningClient for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.trim())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        first_choice_content(parsed)
    }
}

fn first_choice_content(parsed: ChatResponse) -> Result<String> {
    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| ServiceError::MalformedReply("reply has no choices".to_string()))
}
