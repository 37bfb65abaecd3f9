//! # tally-llm
//!
//! Client for the language model that turns Tally's free text into
//! directives, SQL, and summaries.
//!
//! - [`client`]: the [`Completion`] seam and its OpenAI-compatible
//!   implementation.
//! - [`assistant`]: the three calls Tally makes, built on any `Completion`.
//! - [`prompts`]: system messages.

pub mod assistant;
pub mod client;
pub mod error;
pub mod http;
pub mod prompts;

pub use assistant::Assistant;
pub use client::{ChatMessage, ChatRequest, Completion, OpenAiCompatClient};
pub use error::LlmError;
