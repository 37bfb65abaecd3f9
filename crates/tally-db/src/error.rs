//! Database error types for tally-db.

use thiserror::Error;

/// Errors from ledger store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or a row could not be mapped.
    #[error("Query failed: {0}")]
    Query(String),

    /// Creating one of the ledger tables failed.
    #[error("Failed to create table '{table}': {reason}")]
    Schema { table: String, reason: String },

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A student with this (case-folded) name already exists.
    #[error("Student '{0}' already exists")]
    DuplicateStudent(String),

    /// The active statement policy refused a model-authored statement.
    #[error("Statement rejected by {policy} policy: {reason}")]
    RejectedStatement { policy: String, reason: String },

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}
