//! # tally-db
//!
//! libSQL ledger store for Tally.
//!
//! Holds the three relations of the invoice ledger (students, session
//! entries, generated invoices) in a single local `SQLite` file. Every
//! operation opens its own connection and drops it on return, including
//! error paths; nothing is cached between operations.
//!
//! Repository methods live in [`repos`] as `impl TallyDb` blocks.

pub mod error;
pub mod helpers;
pub mod repos;
mod schema;

pub use error::DatabaseError;
pub use repos::query::QueryResult;
pub use schema::LEDGER_TABLES;

use libsql::Builder;

/// Handle on the ledger file.
///
/// Holds the opened database but no connection; see [`TallyDb::connect`].
pub struct TallyDb {
    db: libsql::Database,
    path: String,
}

impl TallyDb {
    /// Open (or create) the ledger file at `path`.
    ///
    /// Does not create tables; call [`TallyDb::ensure_schema`] once at
    /// startup.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file cannot be opened.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        tracing::debug!(path, "opened ledger store");
        Ok(Self {
            db,
            path: path.to_string(),
        })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Open a connection scoped to one operation.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection cannot be opened or
    /// configured.
    pub async fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("PRAGMA foreign_keys: {e}")))?;

        Ok(conn)
    }
}

#[cfg(test)]
mod test_support;
