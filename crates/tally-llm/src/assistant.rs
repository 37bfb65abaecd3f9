//! The three model calls Tally makes.

use serde::Serialize;
use serde_json::Value;

use crate::client::{ChatMessage, ChatRequest, Completion};
use crate::error::LlmError;
use crate::prompts;

/// Wraps a [`Completion`] with Tally's prompts and reply parsing.
pub struct Assistant<C> {
    completion: C,
}

impl<C: Completion> Assistant<C> {
    pub const fn new(completion: C) -> Self {
        Self { completion }
    }

    /// Ask for a `{function, args}` directive for a free-text note.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` on transport failure or a reply that is not a
    /// JSON object.
    pub async fn directive_for(&self, prompt: &str) -> Result<Value, LlmError> {
        let req = ChatRequest {
            messages: vec![
                ChatMessage::system(prompts::FUNCTION_CATALOGUE),
                ChatMessage::user(prompt),
            ],
            json_mode: true,
        };
        self.ask_json(&req).await
    }

    /// Ask for a `{request, sql_query}` object answering `request`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` on transport failure or a reply that is not a
    /// JSON object.
    pub async fn query_for(&self, request: &str) -> Result<Value, LlmError> {
        let req = ChatRequest {
            messages: vec![
                ChatMessage::system(prompts::sql_query_prompt(request)),
                ChatMessage::user(request),
            ],
            json_mode: true,
        };
        self.ask_json(&req).await
    }

    /// Ask for a plain-language answer to `request` given raw `results`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` on transport failure or if `results` cannot be
    /// serialized.
    pub async fn summarize<T: Serialize + Sync>(
        &self,
        request: &str,
        results: &T,
    ) -> Result<String, LlmError> {
        let results = serde_json::to_string(results)
            .map_err(|e| LlmError::Parse(format!("query results: {e}")))?;
        let req = ChatRequest {
            messages: vec![
                ChatMessage::system(prompts::RESULT_PRESENTATION),
                ChatMessage::user(prompts::result_message(request, &results)),
            ],
            json_mode: false,
        };
        let reply = self.completion.complete(&req).await?;
        tracing::info!(reply = %reply, "model reply");
        Ok(reply)
    }

    async fn ask_json(&self, req: &ChatRequest) -> Result<Value, LlmError> {
        let reply = self.completion.complete(req).await?;
        tracing::info!(reply = %reply, "model reply");

        let value: Value = serde_json::from_str(strip_code_fence(&reply))
            .map_err(|e| LlmError::Parse(format!("model reply is not JSON: {e}")))?;
        if !value.is_object() {
            return Err(LlmError::Parse("model reply is not a JSON object".into()));
        }
        Ok(value)
    }
}

/// Unwrap a reply fenced as a Markdown code block, dropping an info word
/// such as `json` whether or not it sits on its own line.
#[must_use]
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    let info_len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(inner.len());
    inner[info_len..].trim()
}
