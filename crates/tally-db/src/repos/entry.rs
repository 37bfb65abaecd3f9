//! Session entry repository.

use chrono::{Local, NaiveDate};

use tally_core::directive::NewEntry;
use tally_core::entities::{SessionEntry, Student};

use crate::TallyDb;
use crate::error::DatabaseError;
use crate::helpers::{format_date, get_string_or_empty, parse_date, parse_datetime};

pub(crate) const ENTRY_COLUMNS: &str =
    "id, student_id, num_hours, subject, session_date, comments, created_at";

pub(crate) fn row_to_entry(row: &libsql::Row) -> Result<SessionEntry, DatabaseError> {
    Ok(SessionEntry {
        id: row.get::<i64>(0)?,
        student_id: row.get::<i64>(1)?,
        num_hours: row.get::<f64>(2)?,
        subject: row.get::<String>(3)?,
        session_date: parse_date(&row.get::<String>(4)?)?,
        comments: get_string_or_empty(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl TallyDb {
    /// Record a session for an already-resolved student.
    ///
    /// The entry snapshots the student's current subject. A missing
    /// `session_date` defaults to today's local date.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn add_entry(
        &self,
        student: &Student,
        entry: &NewEntry,
    ) -> Result<SessionEntry, DatabaseError> {
        let session_date = entry
            .session_date
            .unwrap_or_else(|| Local::now().date_naive());
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO invoice_entries (student_id, num_hours, subject, session_date, comments)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            libsql::params![
                student.id,
                entry.num_hours,
                student.subject.as_str(),
                format_date(session_date),
                entry.comments.as_str()
            ],
        )
        .await?;

        let id = conn.last_insert_rowid();
        let mut rows = conn
            .query(
                &format!("SELECT {ENTRY_COLUMNS} FROM invoice_entries WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let created = row_to_entry(&row)?;

        tracing::info!(
            student = %student.name,
            hours = created.num_hours,
            date = %created.session_date,
            comments = %created.comments,
            "invoice entry added"
        );
        Ok(created)
    }

    /// Number of stored entries across all students.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_entries(&self) -> Result<i64, DatabaseError> {
        self.count("invoice_entries").await
    }
}

/// Entries for a student, optionally only those dated strictly after
/// `after`, ordered by session date then id.
pub(crate) async fn entries_on(
    conn: &libsql::Connection,
    student_id: i64,
    after: Option<NaiveDate>,
) -> Result<Vec<SessionEntry>, DatabaseError> {
    let mut rows = match after {
        Some(date) => {
            conn.query(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM invoice_entries
                     WHERE student_id = ?1 AND session_date > ?2
                     ORDER BY session_date, id"
                ),
                libsql::params![student_id, format_date(date)],
            )
            .await?
        }
        None => {
            conn.query(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM invoice_entries
                     WHERE student_id = ?1 ORDER BY session_date, id"
                ),
                [student_id],
            )
            .await?
        }
    };

    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(row_to_entry(&row)?);
    }
    Ok(entries)
}
