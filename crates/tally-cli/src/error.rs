use std::fmt;

use tally_core::CoreError;
use tally_db::DatabaseError;
use tally_llm::LlmError;
use thiserror::Error;

/// Why a directive ended without an outcome.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] DatabaseError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Failure category reported with every failed directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    InvalidSelection,
    NoBillableData,
    StorageFault,
    MalformedDirective,
    ModelFault,
    /// Console I/O and anything else outside the ledger and the model.
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Ambiguous => "ambiguous",
            Self::InvalidSelection => "invalid_selection",
            Self::NoBillableData => "no_billable_data",
            Self::StorageFault => "storage_fault",
            Self::MalformedDirective => "malformed_directive",
            Self::ModelFault => "model_fault",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DirectiveError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(CoreError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Core(CoreError::Ambiguous { .. }) => ErrorKind::Ambiguous,
            Self::Core(CoreError::InvalidSelection { .. }) => ErrorKind::InvalidSelection,
            Self::Core(CoreError::NoBillableData { .. }) => ErrorKind::NoBillableData,
            Self::Core(CoreError::MalformedDirective(_)) => ErrorKind::MalformedDirective,
            Self::Core(CoreError::Other(_)) => ErrorKind::Internal,
            Self::Storage(_) => ErrorKind::StorageFault,
            Self::Llm(_) => ErrorKind::ModelFault,
        }
    }
}
