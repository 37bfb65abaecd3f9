//! Cross-cutting error types for Tally.
//!
//! These are the user-facing outcomes a directive can end in before anything
//! is committed. Storage faults live in `tally-db` as `DatabaseError`, model
//! faults in `tally-llm` as `LlmError`; `tally-cli` converges all of them.

use thiserror::Error;

/// Errors raised while interpreting a directive against the ledger.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No stored student name contains the fragment.
    #[error("No students found with the name '{fragment}'")]
    NotFound { fragment: String },

    /// Several students match and no selection was made.
    #[error("More than one match found for '{fragment}': {}", candidates.join(", "))]
    Ambiguous {
        fragment: String,
        candidates: Vec<String>,
    },

    /// A disambiguation choice outside `1..=count`, or not a number at all.
    #[error("Invalid choice '{choice}': expected a number between 1 and {count}")]
    InvalidSelection { choice: String, count: usize },

    /// Nothing to bill since the last generated invoice.
    #[error("No invoice entries found for '{student}'")]
    NoBillableData { student: String },

    /// The model's output is missing fields, names an unknown function, or
    /// carries values that cannot be coerced.
    #[error("Malformed directive: {0}")]
    MalformedDirective(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
