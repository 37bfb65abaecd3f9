//! Generated invoice repository and billing-period derivation.
//!
//! The open period for a student is every entry dated strictly after the
//! end date of their latest invoice (by end date), or every entry if they
//! have never been invoiced. Entries dated on or before that end date but
//! recorded later are never picked up again.

use tally_core::entities::{BillablePeriod, GeneratedInvoice, SessionEntry, Student};

use crate::TallyDb;
use crate::error::DatabaseError;
use crate::helpers::{format_date, parse_date, parse_datetime};
use crate::repos::entry::entries_on;

const INVOICE_COLUMNS: &str =
    "id, student_id, subject, num_hours, total_amount, start_date, end_date, created_at";

fn row_to_invoice(row: &libsql::Row) -> Result<GeneratedInvoice, DatabaseError> {
    Ok(GeneratedInvoice {
        id: row.get::<i64>(0)?,
        student_id: row.get::<i64>(1)?,
        subject: row.get::<String>(2)?,
        num_hours: row.get::<f64>(3)?,
        total_amount: row.get::<f64>(4)?,
        start_date: parse_date(&row.get::<String>(5)?)?,
        end_date: parse_date(&row.get::<String>(6)?)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

/// Aggregate entries already in session-date order. `None` when empty.
#[must_use]
pub fn period_from_entries(entries: &[SessionEntry]) -> Option<BillablePeriod> {
    let first = entries.first()?;
    let last = entries.last()?;
    Some(BillablePeriod {
        hours_total: entries.iter().map(|e| e.num_hours).sum(),
        start_date: first.session_date,
        end_date: last.session_date,
        entries: entries.len(),
    })
}

impl TallyDb {
    /// The student's latest invoice by end date.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn last_invoice(
        &self,
        student_id: i64,
    ) -> Result<Option<GeneratedInvoice>, DatabaseError> {
        let conn = self.connect().await?;
        last_invoice_on(&conn, student_id).await
    }

    /// Entries not yet covered by any invoice, in session-date order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn unbilled_entries(
        &self,
        student_id: i64,
    ) -> Result<Vec<SessionEntry>, DatabaseError> {
        let conn = self.connect().await?;
        unbilled_on(&conn, student_id).await
    }

    /// Compute the open billing period without committing anything.
    ///
    /// Returns `None` when there is nothing to bill.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn derive_billable_period(
        &self,
        student: &Student,
    ) -> Result<Option<BillablePeriod>, DatabaseError> {
        let entries = self.unbilled_entries(student.id).await?;
        Ok(period_from_entries(&entries))
    }

    /// Derive the open period and append one invoice for it at the student's
    /// current rate.
    ///
    /// Derivation and insert share one transaction. Returns `None`, and
    /// writes nothing, when there is nothing to bill. Two concurrent calls
    /// for the same student must be serialized by the caller.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query or the commit fails.
    pub async fn generate_invoice(
        &self,
        student: &Student,
    ) -> Result<Option<(GeneratedInvoice, BillablePeriod)>, DatabaseError> {
        let conn = self.connect().await?;
        let tx = conn.transaction().await?;

        let entries = unbilled_on(&tx, student.id).await?;
        let Some(period) = period_from_entries(&entries) else {
            tracing::debug!(student = %student.name, "no unbilled entries");
            return Ok(None);
        };
        let total_amount = period.total_at(student.per_hour_rate);

        tx.execute(
            "INSERT INTO generated_invoices
                (student_id, subject, num_hours, total_amount, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![
                student.id,
                student.subject.as_str(),
                period.hours_total,
                total_amount,
                format_date(period.start_date),
                format_date(period.end_date)
            ],
        )
        .await?;

        let id = tx.last_insert_rowid();
        let mut rows = tx
            .query(
                &format!("SELECT {INVOICE_COLUMNS} FROM generated_invoices WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let invoice = row_to_invoice(&row)?;
        drop(rows);

        tx.commit().await?;

        tracing::info!(
            student = %student.name,
            hours = invoice.num_hours,
            total = invoice.total_amount,
            start = %invoice.start_date,
            end = %invoice.end_date,
            "invoice generated"
        );
        Ok(Some((invoice, period)))
    }

    /// Number of stored invoices across all students.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_invoices(&self) -> Result<i64, DatabaseError> {
        self.count("generated_invoices").await
    }
}

async fn last_invoice_on(
    conn: &libsql::Connection,
    student_id: i64,
) -> Result<Option<GeneratedInvoice>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {INVOICE_COLUMNS} FROM generated_invoices
                 WHERE student_id = ?1 ORDER BY end_date DESC, id DESC LIMIT 1"
            ),
            [student_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_invoice(&row)?)),
        None => Ok(None),
    }
}

async fn unbilled_on(
    conn: &libsql::Connection,
    student_id: i64,
) -> Result<Vec<SessionEntry>, DatabaseError> {
    let after = last_invoice_on(conn, student_id)
        .await?
        .map(|invoice| invoice.end_date);
    entries_on(conn, student_id, after).await
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;

    use super::period_from_entries;
    use tally_core::entities::SessionEntry;

    fn entry(id: i64, hours: f64, day: u32) -> SessionEntry {
        SessionEntry {
            id,
            student_id: 1,
            num_hours: hours,
            subject: "math".into(),
            session_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            comments: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_entries_have_no_period() {
        assert_eq!(period_from_entries(&[]), None);
    }

    #[test]
    fn period_bounds_follow_order() {
        let period =
            period_from_entries(&[entry(1, 2.0, 1), entry(2, 3.0, 1), entry(3, 1.5, 4)]).unwrap();
        assert!((period.hours_total - 6.5).abs() < f64::EPSILON);
        assert_eq!(period.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(period.end_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(period.entries, 3);
    }
}
