use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An append-only billing snapshot covering a run of session entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedInvoice {
    pub id: i64,
    pub student_id: i64,
    pub subject: String,
    pub num_hours: f64,
    pub total_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// The open billing window for a student: entries not yet covered by any
/// generated invoice, aggregated.
///
/// `start_date` and `end_date` are the dates of the first and last entry in
/// session-date order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillablePeriod {
    pub hours_total: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub entries: usize,
}

impl BillablePeriod {
    /// Total amount for this period at the given hourly rate.
    #[must_use]
    pub fn total_at(&self, per_hour_rate: f64) -> f64 {
        self.hours_total * per_hour_rate
    }
}
