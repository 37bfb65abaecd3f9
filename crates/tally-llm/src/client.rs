//! OpenAI-compatible chat client.
//!
//! Speaks the `/chat/completions` contract shared by OpenAI, Ollama, vLLM,
//! LM Studio and similar servers. Every call is non-streaming and runs at
//! temperature 0.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tally_config::LlmConfig;

use crate::error::LlmError;
use crate::http::check_response;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Ask the server for a JSON object reply.
    pub json_mode: bool,
}

/// Something that can answer a chat request with the reply text.
///
/// The router only depends on this, so tests can script replies.
pub trait Completion {
    /// Send `req` and return the first choice's message content.
    fn complete(&self, req: &ChatRequest) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// [`Completion`] over HTTP against an OpenAI-compatible endpoint.
pub struct OpenAiCompatClient {
    url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the HTTP client cannot be built.
    pub fn new(cfg: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            url: cfg.chat_completions_url(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            client,
        })
    }

    /// Model identifier sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_chat_body(&self, req: &ChatRequest) -> Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": req.messages,
            "temperature": 0.0,
            "stream": false,
        });
        if req.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }
        body
    }
}

impl Completion for OpenAiCompatClient {
    async fn complete(&self, req: &ChatRequest) -> Result<String, LlmError> {
        let body = self.build_chat_body(req);
        tracing::debug!(url = %self.url, model = %self.model, json_mode = req.json_mode, "chat request");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("chat response body: {e}")))?;

        parse_chat_response(&json)
    }
}

/// Pull `choices[0].message.content` out of a chat completions reply.
///
/// # Errors
///
/// Returns `LlmError::EmptyResponse` when there is no choice or the content
/// is missing, null or blank.
pub fn parse_chat_response(json: &Value) -> Result<String, LlmError> {
    json.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or(LlmError::EmptyResponse)
}
