//! Idempotent schema bootstrap.
//!
//! Each table is checked and created independently, so a run that stopped
//! half-way is completed by the next one. There is no migration logic:
//! existing tables are never altered.

use crate::TallyDb;
use crate::error::DatabaseError;

const STUDENTS: &str = "
CREATE TABLE students (
    id INTEGER PRIMARY KEY,
    name TEXT UNIQUE NOT NULL,
    per_hour_rate REAL NOT NULL,
    subject TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const INVOICE_ENTRIES: &str = "
CREATE TABLE invoice_entries (
    id INTEGER PRIMARY KEY,
    student_id INTEGER NOT NULL,
    num_hours REAL NOT NULL,
    subject TEXT NOT NULL,
    session_date DATE DEFAULT CURRENT_DATE,
    comments TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (student_id) REFERENCES students(id)
)";

const GENERATED_INVOICES: &str = "
CREATE TABLE generated_invoices (
    id INTEGER PRIMARY KEY,
    student_id INTEGER NOT NULL,
    subject TEXT NOT NULL,
    num_hours REAL NOT NULL,
    total_amount REAL NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (student_id) REFERENCES students(id)
)";

/// Ledger tables in creation order, with their DDL.
pub const LEDGER_TABLES: [(&str, &str); 3] = [
    ("students", STUDENTS),
    ("invoice_entries", INVOICE_ENTRIES),
    ("generated_invoices", GENERATED_INVOICES),
];

impl TallyDb {
    /// Create whichever ledger tables do not exist yet.
    ///
    /// Returns the names of the tables created by this call; empty when the
    /// schema was already complete.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Schema` naming the table whose creation failed.
    pub async fn ensure_schema(&self) -> Result<Vec<&'static str>, DatabaseError> {
        let conn = self.connect().await?;
        let mut created = Vec::new();

        for (table, ddl) in LEDGER_TABLES {
            if table_exists(&conn, table).await? {
                continue;
            }
            conn.execute(ddl, ())
                .await
                .map_err(|e| DatabaseError::Schema {
                    table: table.to_string(),
                    reason: e.to_string(),
                })?;
            tracing::info!(table, "table created");
            created.push(table);
        }

        Ok(created)
    }

    /// Whether a table with this name exists.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the catalog query fails.
    pub async fn table_exists(&self, table: &str) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        table_exists(&conn, table).await
    }
}

async fn table_exists(conn: &libsql::Connection, table: &str) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
        )
        .await?;
    Ok(rows.next().await?.is_some())
}
