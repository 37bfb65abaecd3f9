//! Directive parsing: the model's JSON reply → typed function call.
//!
//! Function-call replies have the shape `{"function": <name>, "args": {...}}`;
//! free-form replies have the shape `{"request": <text>, "sql_query": <text>}`.
//! Values are coerced leniently (numeric strings, `"NULL"` dates) because the
//! producer is a language model, but anything that cannot be coerced is a
//! `CoreError::MalformedDirective`.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::enums::FunctionName;
use crate::errors::CoreError;

/// Arguments for `add_student`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStudent {
    pub name: String,
    pub per_hour_rate: f64,
    pub subject: String,
}

/// Arguments for `add_invoice_entry`.
///
/// `session_date` of `None` means "today" at insert time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntry {
    pub student_name: String,
    pub num_hours: f64,
    pub session_date: Option<NaiveDate>,
    pub comments: String,
}

/// A parsed function-call directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "function", content = "args", rename_all = "snake_case")]
pub enum Directive {
    AddStudent(NewStudent),
    AddInvoiceEntry(NewEntry),
    GenerateInvoice { student_name: String },
}

impl Directive {
    /// Parse a function-call reply.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedDirective` if `function` is missing or
    /// unknown, `args` is not an object, or a required argument is missing
    /// or cannot be coerced.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| malformed("directive is not a JSON object"))?;

        let name = object
            .get("function")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing 'function'"))?;
        let function = FunctionName::from_wire(name)
            .ok_or_else(|| malformed(format!("unknown function '{name}'")))?;

        let empty = Map::new();
        let args = match object.get("args") {
            Some(Value::Object(args)) => args,
            None | Some(Value::Null) => &empty,
            Some(_) => return Err(malformed("'args' is not a JSON object")),
        };

        match function {
            FunctionName::AddStudent => Ok(Self::AddStudent(NewStudent {
                name: required_str(args, "name")?,
                per_hour_rate: required_positive(args, "per_hour_rate")?,
                subject: required_str(args, "subject")?,
            })),
            FunctionName::AddInvoiceEntry => Ok(Self::AddInvoiceEntry(NewEntry {
                student_name: required_str(args, "student_name")?,
                num_hours: required_positive(args, "num_hours")?,
                session_date: optional_date(args, "session_date")?,
                comments: optional_str(args, "comments").unwrap_or_default(),
            })),
            FunctionName::GenerateInvoice => Ok(Self::GenerateInvoice {
                student_name: required_str(args, "student_name")?,
            }),
        }
    }

    #[must_use]
    pub const fn function(&self) -> FunctionName {
        match self {
            Self::AddStudent(_) => FunctionName::AddStudent,
            Self::AddInvoiceEntry(_) => FunctionName::AddInvoiceEntry,
            Self::GenerateInvoice { .. } => FunctionName::GenerateInvoice,
        }
    }
}

/// A parsed free-form query reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDirective {
    pub request: Option<String>,
    pub sql_query: String,
}

impl QueryDirective {
    /// Parse a free-form query reply.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedDirective` if `sql_query` is absent or
    /// blank.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| malformed("query reply is not a JSON object"))?;
        let sql_query = optional_str(object, "sql_query")
            .ok_or_else(|| malformed("No SQL query provided"))?;
        Ok(Self {
            request: optional_str(object, "request"),
            sql_query,
        })
    }
}

fn malformed(message: impl Into<String>) -> CoreError {
    CoreError::MalformedDirective(message.into())
}

/// Non-blank string value, trimmed. `null` and blank strings are `None`.
fn optional_str(args: &Map<String, Value>, key: &str) -> Option<String> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn required_str(args: &Map<String, Value>, key: &str) -> Result<String, CoreError> {
    optional_str(args, key).ok_or_else(|| malformed(format!("missing required argument '{key}'")))
}

fn required_positive(args: &Map<String, Value>, key: &str) -> Result<f64, CoreError> {
    let number = match args.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
        None | Some(Value::Null) => {
            return Err(malformed(format!("missing required argument '{key}'")));
        }
        Some(_) => None,
    };
    match number {
        Some(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(malformed(format!(
            "argument '{key}' must be a positive number, got {}",
            args.get(key).map_or_else(String::new, ToString::to_string)
        ))),
    }
}

fn optional_date(args: &Map<String, Value>, key: &str) -> Result<Option<NaiveDate>, CoreError> {
    let Some(raw) = optional_str(args, key) else {
        return Ok(None);
    };
    if raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_date(&raw)
        .map(Some)
        .ok_or_else(|| malformed(format!("argument '{key}' is not a date: '{raw}'")))
}

/// Parse `YYYY-MM-DD`, or take the date part of an RFC 3339 timestamp.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
