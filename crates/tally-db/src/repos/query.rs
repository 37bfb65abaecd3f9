//! Free-form execution of model-authored SQL.
//!
//! The text comes from a language model, so what may run is decided by a
//! [`SqlPolicy`]. Either way the text must hold exactly one statement.
//! Under `Unrestricted` that statement runs as written, writes included.
//! Under `ReadOnly` it must be a `SELECT`/`WITH` and it runs on a
//! `query_only` connection.

use serde::Serialize;
use serde_json::Value;
use tally_core::enums::SqlPolicy;

use crate::TallyDb;
use crate::error::DatabaseError;
use crate::helpers::sql_value_to_json;

/// Raw result of a free-form statement: column names and positional rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Decide whether `sql` may run under `policy` and return the one
/// statement it holds, without its terminator.
///
/// Text holding more than one statement is refused under every policy:
/// libSQL would run the first and silently drop the rest.
///
/// # Errors
///
/// Returns `DatabaseError::RejectedStatement` with the reason.
pub fn check_statement(policy: SqlPolicy, sql: &str) -> Result<&str, DatabaseError> {
    let reject = |reason: &str| DatabaseError::RejectedStatement {
        policy: policy.to_string(),
        reason: reason.to_string(),
    };

    let mut statements = split_statements(sql).filter(|s| !skip_trivia(s).is_empty());
    let Some(statement) = statements.next() else {
        return Err(reject("empty statement"));
    };
    if statements.next().is_some() {
        return Err(reject("multiple statements"));
    }
    let statement = statement.trim();

    if policy == SqlPolicy::ReadOnly {
        let keyword = skip_trivia(statement)
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        if keyword != "SELECT" && keyword != "WITH" {
            return Err(reject(&format!("{keyword} is not a read statement")));
        }
    }
    Ok(statement)
}

/// Split on `;` outside string literals, quoted identifiers and comments.
fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(sql);
    std::iter::from_fn(move || {
        let current = rest?;
        let end = statement_end(current);
        rest = end.map(|i| &current[i + 1..]);
        Some(&current[..end.unwrap_or(current.len())])
    })
}

/// Byte offset of the first top-level `;`, if any.
fn statement_end(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b';' => return Some(i),
            // Doubled quotes ('it''s') close and reopen, which scans the same.
            quote @ (b'\'' | b'"' | b'`') => i = skip_past(bytes, i + 1, &[quote]),
            b'[' => i = skip_past(bytes, i + 1, b"]"),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_past(bytes, i + 2, b"\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_past(bytes, i + 2, b"*/"),
            _ => i += 1,
        }
    }
    None
}

/// Index just past the next `close` at or after `from`, or the end.
fn skip_past(bytes: &[u8], from: usize, close: &[u8]) -> usize {
    bytes
        .get(from..)
        .and_then(|tail| tail.windows(close.len()).position(|w| w == close))
        .map_or(bytes.len(), |pos| from + pos + close.len())
}

/// Drop leading whitespace and comments.
fn skip_trivia(mut sql: &str) -> &str {
    loop {
        sql = sql.trim_start();
        if let Some(tail) = sql.strip_prefix("--") {
            sql = tail.split_once('\n').map_or("", |(_, after)| after);
        } else if let Some(tail) = sql.strip_prefix("/*") {
            sql = tail.split_once("*/").map_or("", |(_, after)| after);
        } else {
            return sql;
        }
    }
}

impl TallyDb {
    /// Execute a model-authored statement and collect every row it returns.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::RejectedStatement` if the policy refuses the
    /// statement, or `DatabaseError` if it fails to execute.
    pub async fn execute_custom_sql(
        &self,
        sql: &str,
        policy: SqlPolicy,
    ) -> Result<QueryResult, DatabaseError> {
        let statement = check_statement(policy, sql)?;

        let conn = self.connect().await?;
        if policy == SqlPolicy::ReadOnly {
            conn.execute("PRAGMA query_only = ON", ())
                .await
                .map_err(|e| DatabaseError::Query(format!("PRAGMA query_only: {e}")))?;
        }

        let mut rows = conn.query(statement, ()).await?;
        let column_count = rows.column_count();
        let columns = (0..column_count)
            .map(|idx| rows.column_name(idx).unwrap_or_default().to_string())
            .collect::<Vec<_>>();

        let mut result = QueryResult {
            columns,
            rows: Vec::new(),
        };
        while let Some(row) = rows.next().await? {
            let values = (0..column_count)
                .map(|idx| row.get_value(idx).map(sql_value_to_json))
                .collect::<Result<Vec<_>, _>>()?;
            result.rows.push(values);
        }

        tracing::info!(
            %policy,
            rows = result.rows.len(),
            "custom SQL query executed"
        );
        Ok(result)
    }
}
