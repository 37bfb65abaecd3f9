//! Language-model client error types.

use thiserror::Error;

/// Errors from talking to the language model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The endpoint returned 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The reply had no choices or no message content.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The reply could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The client could not be built from its configuration.
    #[error("client configuration error: {0}")]
    Config(String),
}
