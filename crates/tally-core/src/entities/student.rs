use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tutored student. `name` and `subject` are stored case-folded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub per_hour_rate: f64,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}
