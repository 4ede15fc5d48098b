use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// The endpoint answered, but without a message body to parse.
#[derive(Debug, Error)]
#[error("chat response has no message content")]
pub struct MissingContent;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder().timeout(timeout).build().context("failed to build HTTP client")
}

async fn post_chat(request: reqwest::RequestBuilder, body: &ChatRequest<'_>) -> Result<Value> {
    let response = request.json(body).send().await.context("chat request failed")?;
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(anyhow!("chat endpoint returned {status}: {detail}"));
    }
    response.json::<Value>().await.context("chat response is not JSON")
}

/// Reads `choices[0].message.content` from a chat-completions response.
pub fn openai_content(body: &Value) -> Result<String> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MissingContent.into())
}

/// Reads `message.content` from an Ollama `/api/chat` response.
pub fn ollama_content(body: &Value) -> Result<String> {
    body.pointer("/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MissingContent.into())
}

/// OpenAI-compatible `POST {base_url}/chat/completions`.
pub struct OpenAiChatClient {
    client: Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
}

impl OpenAiChatClient {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(anyhow!("OpenAI API key cannot be empty"));
        }
        let base_url = base_url.unwrap_or(OPENAI_DEFAULT_BASE_URL).trim_end_matches('/');

        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model: model.into(),
            endpoint: format!("{base_url}/chat/completions"),
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            stream: None,
        };
        debug!(event_name = "agent.llm.request", provider = "openai", model = %self.model);

        let request = self.client.post(&self.endpoint).bearer_auth(self.api_key.expose_secret());
        let response = post_chat(request, &body).await?;
        openai_content(&response)
    }
}

/// Ollama `POST {base_url}/api/chat` with streaming off.
pub struct OllamaChatClient {
    client: Client,
    model: String,
    endpoint: String,
}

impl OllamaChatClient {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            model: model.into(),
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl LlmClient for OllamaChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            stream: Some(false),
        };
        debug!(event_name = "agent.llm.request", provider = "ollama", model = %self.model);

        let response = post_chat(self.client.post(&self.endpoint), &body).await?;
        ollama_content(&response)
    }
}
