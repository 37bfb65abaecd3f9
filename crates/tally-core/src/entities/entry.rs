use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One billable tutoring session.
///
/// `subject` is a snapshot of the student's subject at the time the entry was
/// recorded, not a live join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntry {
    pub id: i64,
    pub student_id: i64,
    pub num_hours: f64,
    pub subject: String,
    pub session_date: NaiveDate,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}
