//! Enums shared across Tally crates.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SqlPolicy
// ---------------------------------------------------------------------------

/// Which model-authored SQL statements the free-form query path may execute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlPolicy {
    /// Execute the statement verbatim, reads and writes alike.
    #[default]
    Unrestricted,
    /// Accept a single `SELECT`/`WITH` statement on a query-only connection.
    ReadOnly,
}

impl SqlPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unrestricted => "unrestricted",
            Self::ReadOnly => "read_only",
        }
    }
}

impl fmt::Display for SqlPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FunctionName
// ---------------------------------------------------------------------------

/// The fixed functions a directive may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionName {
    AddStudent,
    AddInvoiceEntry,
    GenerateInvoice,
}

impl FunctionName {
    pub const ALL: [Self; 3] = [Self::AddStudent, Self::AddInvoiceEntry, Self::GenerateInvoice];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddStudent => "add_student",
            Self::AddInvoiceEntry => "add_invoice_entry",
            Self::GenerateInvoice => "generate_invoice",
        }
    }

    /// Look up a function by its wire name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
