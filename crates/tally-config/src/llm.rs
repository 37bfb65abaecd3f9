//! Language-model endpoint configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default OpenAI-compatible endpoint (a local Ollama server).
fn default_base_url() -> String {
    String::from("http://localhost:11434/v1")
}

/// Ollama ignores the key, but the header must be present.
fn default_api_key() -> String {
    String::from("none")
}

fn default_model() -> String {
    String::from("openhermes")
}

const fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API, without `/chat/completions`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential sent with every request.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Model identifier passed in the request body.
    #[serde(default = "default_model")]
    pub model: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Full chat completions URL.
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Check that the endpoint is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty or non-http(s)
    /// `base_url`, an empty `model`, or a zero `timeout_secs`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "llm.base_url".into(),
                reason: format!("expected an http(s) URL, got '{}'", self.base_url),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "llm.model".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = LlmConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "openhermes");
    }

    #[test]
    fn chat_url_strips_trailing_slash() {
        let config = LlmConfig {
            base_url: "https://api.openai.com/v1/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.chat_completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = LlmConfig {
            base_url: "192.168.2.49:11434/v1".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "llm.base_url"));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = LlmConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
