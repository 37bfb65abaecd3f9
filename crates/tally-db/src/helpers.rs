//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entities.
//! Timestamps come from `CURRENT_TIMESTAMP` (`"2024-01-05 14:30:00"`), dates
//! are stored as `YYYY-MM-DD` text.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::error::DatabaseError;

/// Parse a TEXT timestamp column as `DateTime<Utc>`.
///
/// Handles both `SQLite`'s default format and RFC 3339.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string matches neither format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a DATE column stored as `YYYY-MM-DD` text.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the text is not a date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    tally_core::directive::parse_date(s)
        .ok_or_else(|| DatabaseError::Query(format!("Failed to parse date '{s}'")))
}

/// Format a date the way it is stored and compared in SQL.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Read a nullable TEXT column, mapping NULL to the empty string.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_string_or_empty(row: &libsql::Row, idx: i32) -> Result<String, DatabaseError> {
    Ok(row.get::<Option<String>>(idx)?.unwrap_or_default())
}

/// Whether a libSQL error is a UNIQUE constraint violation.
pub fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

/// Convert a dynamically typed SQL value into JSON for the summarizer.
///
/// Blobs become lowercase hex strings; non-finite reals become `null`.
#[must_use]
pub fn sql_value_to_json(value: libsql::Value) -> Value {
    match value {
        libsql::Value::Null => Value::Null,
        libsql::Value::Integer(i) => Value::from(i),
        libsql::Value::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        libsql::Value::Text(s) => Value::String(s),
        libsql::Value::Blob(bytes) => {
            Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect())
        }
    }
}
