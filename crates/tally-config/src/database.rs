//! Ledger store configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    String::from("student_invoices.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite file. Must be a file: every operation opens its own
    /// connection, so `:memory:` would never see earlier writes.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}
