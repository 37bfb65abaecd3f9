//! Intent router: one free-text request in, one outcome out.
//!
//! A request moves `awaiting_directive → dispatched → {succeeded, failed}`
//! inside a `directive` span. Nothing is written to the ledger until the
//! directive has been parsed and every student reference resolved.

use serde::Serialize;
use tally_core::CoreError;
use tally_core::directive::{Directive, QueryDirective};
use tally_core::entities::{GeneratedInvoice, SessionEntry, Student};
use tally_core::enums::SqlPolicy;
use tally_core::resolution::Resolution;
use tally_db::{QueryResult, TallyDb};
use tally_llm::{Assistant, Completion};
use tracing::Instrument;

use crate::error::DirectiveError;
use crate::picker::Disambiguator;

/// What a succeeded directive did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    StudentAdded {
        student: Student,
    },
    EntryAdded {
        student: Student,
        entry: SessionEntry,
    },
    InvoiceGenerated {
        student: Student,
        invoice: GeneratedInvoice,
        /// Number of session entries the invoice covers.
        entries: usize,
    },
    QueryAnswered {
        request: String,
        sql_query: String,
        result: QueryResult,
        summary: String,
    },
}

pub struct IntentRouter<C> {
    db: TallyDb,
    assistant: Assistant<C>,
    policy: SqlPolicy,
}

impl<C: Completion> IntentRouter<C> {
    pub const fn new(db: TallyDb, assistant: Assistant<C>, policy: SqlPolicy) -> Self {
        Self {
            db,
            assistant,
            policy,
        }
    }

    /// Function-call path: ask the model for a directive and apply it.
    pub async fn execute_prompt(
        &self,
        prompt: &str,
        picker: &mut impl Disambiguator,
    ) -> Result<Outcome, DirectiveError> {
        let span = tracing::info_span!("directive", path = "function_call");
        async {
            tracing::debug!(state = "awaiting_directive");
            finish(self.prompt_outcome(prompt, picker).await)
        }
        .instrument(span)
        .await
    }

    async fn prompt_outcome(
        &self,
        prompt: &str,
        picker: &mut impl Disambiguator,
    ) -> Result<Outcome, DirectiveError> {
        let value = self.assistant.directive_for(prompt).await?;
        let directive = Directive::from_value(&value)?;
        self.apply(directive, picker).await
    }

    /// Apply an already-parsed directive.
    pub async fn apply(
        &self,
        directive: Directive,
        picker: &mut impl Disambiguator,
    ) -> Result<Outcome, DirectiveError> {
        tracing::info!(state = "dispatched", function = %directive.function());
        match directive {
            Directive::AddStudent(new) => {
                let student = self.db.add_student(&new).await?;
                Ok(Outcome::StudentAdded { student })
            }
            Directive::AddInvoiceEntry(new) => {
                let student = self.resolve(&new.student_name, picker).await?;
                let entry = self.db.add_entry(&student, &new).await?;
                Ok(Outcome::EntryAdded { student, entry })
            }
            Directive::GenerateInvoice { student_name } => {
                let student = self.resolve(&student_name, picker).await?;
                let Some((invoice, period)) = self.db.generate_invoice(&student).await? else {
                    return Err(CoreError::NoBillableData {
                        student: student.name,
                    }
                    .into());
                };
                Ok(Outcome::InvoiceGenerated {
                    student,
                    invoice,
                    entries: period.entries,
                })
            }
        }
    }

    /// Free-form path: ask for SQL, run it, and have the model summarize
    /// the raw rows. A failed statement ends the directive before the
    /// summarization call.
    pub async fn handle_request(&self, request: &str) -> Result<Outcome, DirectiveError> {
        let span = tracing::info_span!("directive", path = "query");
        async {
            tracing::debug!(state = "awaiting_directive");
            finish(self.request_outcome(request).await)
        }
        .instrument(span)
        .await
    }

    async fn request_outcome(&self, request: &str) -> Result<Outcome, DirectiveError> {
        let value = self.assistant.query_for(request).await?;
        let query = QueryDirective::from_value(&value)?;

        tracing::info!(state = "dispatched", sql = %query.sql_query, policy = %self.policy);
        let result = self.db.execute_custom_sql(&query.sql_query, self.policy).await?;
        let summary = self.assistant.summarize(request, &result).await?;

        Ok(Outcome::QueryAnswered {
            request: request.to_string(),
            sql_query: query.sql_query,
            result,
            summary,
        })
    }

    async fn resolve(
        &self,
        fragment: &str,
        picker: &mut impl Disambiguator,
    ) -> Result<Student, DirectiveError> {
        match self.db.resolve_student(fragment).await? {
            Resolution::Ambiguous(candidates) => Ok(picker.choose(fragment, candidates)?),
            other => Ok(other.into_unique(fragment)?),
        }
    }
}

/// Record the terminal state of a directive in the current span.
fn finish(result: Result<Outcome, DirectiveError>) -> Result<Outcome, DirectiveError> {
    match &result {
        Ok(_) => tracing::debug!(state = "succeeded"),
        Err(error) => tracing::error!(state = "failed", kind = %error.kind(), %error),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tally_llm::{ChatRequest, LlmError};
    use tempfile::TempDir;

    use super::*;
    use crate::error::ErrorKind;
    use crate::picker::{NonInteractive, PromptPicker};

    #[derive(Default)]
    struct Script {
        replies: VecDeque<String>,
        requests: Vec<ChatRequest>,
    }

    /// Replays canned model replies in order.
    #[derive(Clone, Default)]
    struct Scripted(Arc<Mutex<Script>>);

    impl Scripted {
        fn with(replies: &[&str]) -> Self {
            let script = Self::default();
            script.0.lock().unwrap().replies = replies.iter().map(ToString::to_string).collect();
            script
        }

        fn calls(&self) -> usize {
            self.0.lock().unwrap().requests.len()
        }
    }

    impl Completion for Scripted {
        async fn complete(&self, req: &ChatRequest) -> Result<String, LlmError> {
            let mut script = self.0.lock().unwrap();
            script.requests.push(req.clone());
            script.replies.pop_front().ok_or(LlmError::EmptyResponse)
        }
    }

    /// Log lines written while the returned guard is alive.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture_logs() -> (Captured, tracing::subscriber::DefaultGuard) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (captured, tracing::subscriber::set_default(subscriber))
    }

    async fn router(replies: &[&str], policy: SqlPolicy) -> (TempDir, IntentRouter<Scripted>, Scripted) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("student_invoices.db");
        let db = TallyDb::open_local(&path.to_string_lossy()).await.unwrap();
        db.ensure_schema().await.unwrap();
        let script = Scripted::with(replies);
        let router = IntentRouter::new(db, Assistant::new(script.clone()), policy);
        (dir, router, script)
    }

    fn add_student(name: &str, rate: f64) -> Directive {
        Directive::from_value(&serde_json::json!({
            "function": "add_student",
            "args": {"name": name, "per_hour_rate": rate, "subject": "Math"}
        }))
        .unwrap()
    }

    fn add_entry(name: &str, hours: f64, date: &str) -> Directive {
        Directive::from_value(&serde_json::json!({
            "function": "add_invoice_entry",
            "args": {"student_name": name, "num_hours": hours, "session_date": date}
        }))
        .unwrap()
    }

    fn generate(name: &str) -> Directive {
        Directive::GenerateInvoice {
            student_name: name.into(),
        }
    }

    #[tokio::test]
    async fn prompt_adds_student() {
        let (_dir, router, script) = router(
            &[r#"{"function": "add_student", "args": {"name": "Jane", "per_hour_rate": "$20", "subject": "Math"}}"#],
            SqlPolicy::default(),
        )
        .await;

        let outcome = router
            .execute_prompt("new student jane, 20 an hour, math", &mut NonInteractive)
            .await
            .unwrap();

        match outcome {
            Outcome::StudentAdded { student } => {
                assert_eq!(student.name, "jane");
                assert_eq!(student.subject, "math");
            }
            other => panic!("expected student_added, got {other:?}"),
        }
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_function_mutates_nothing() {
        let (_dir, router, _) = router(
            &[r#"{"function": "delete_student", "args": {"name": "jane"}}"#],
            SqlPolicy::default(),
        )
        .await;

        let err = router
            .execute_prompt("remove jane", &mut NonInteractive)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedDirective);
        assert_eq!(router.db.count_students().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_argument_mutates_nothing() {
        let (_dir, router, _) = router(
            &[r#"{"function": "add_student", "args": {"name": "jane", "subject": "math"}}"#],
            SqlPolicy::default(),
        )
        .await;

        let err = router
            .execute_prompt("add jane", &mut NonInteractive)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedDirective);
        assert_eq!(router.db.count_students().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn model_failure_is_a_model_fault() {
        let (_dir, router, _) = router(&["this is not json"], SqlPolicy::default()).await;
        let err = router
            .execute_prompt("anything", &mut NonInteractive)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelFault);
    }

    #[tokio::test]
    async fn entry_for_unknown_student_is_not_found() {
        let (_dir, router, _) = router(&[], SqlPolicy::default()).await;
        let err = router
            .apply(add_entry("zed", 1.0, "2024-03-01"), &mut NonInteractive)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(router.db.count_entries().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn out_of_range_selection_mutates_nothing() {
        let (_dir, router, _) = router(&[], SqlPolicy::default()).await;
        router.apply(add_student("anna", 20.0), &mut NonInteractive).await.unwrap();
        router.apply(add_student("annie", 25.0), &mut NonInteractive).await.unwrap();

        let mut picker = PromptPicker::new(Cursor::new("5\n"), Vec::new());
        let err = router
            .apply(add_entry("ann", 2.0, "2024-03-01"), &mut picker)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidSelection);
        assert_eq!(router.db.count_entries().await.unwrap(), 0);
        assert_eq!(router.db.count_invoices().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn selection_picks_the_listed_candidate() {
        let (_dir, router, _) = router(&[], SqlPolicy::default()).await;
        router.apply(add_student("anna", 20.0), &mut NonInteractive).await.unwrap();
        router.apply(add_student("annie", 25.0), &mut NonInteractive).await.unwrap();

        let mut picker = PromptPicker::new(Cursor::new("2\n"), Vec::new());
        let outcome = router
            .apply(add_entry("ann", 2.0, "2024-03-01"), &mut picker)
            .await
            .unwrap();

        match outcome {
            Outcome::EntryAdded { student, entry } => {
                assert_eq!(student.name, "annie");
                assert_eq!(entry.student_id, student.id);
                assert_eq!(entry.session_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
            }
            other => panic!("expected entry_added, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ambiguity_without_a_picker_is_an_error() {
        let (_dir, router, _) = router(&[], SqlPolicy::default()).await;
        router.apply(add_student("anna", 20.0), &mut NonInteractive).await.unwrap();
        router.apply(add_student("annie", 25.0), &mut NonInteractive).await.unwrap();

        let err = router.apply(generate("ann"), &mut NonInteractive).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ambiguous);
    }

    #[tokio::test]
    async fn invoice_without_entries_is_no_billable_data() {
        let (_dir, router, _) = router(&[], SqlPolicy::default()).await;
        router.apply(add_student("jane", 20.0), &mut NonInteractive).await.unwrap();

        let err = router.apply(generate("jane"), &mut NonInteractive).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoBillableData);
        assert_eq!(router.db.count_invoices().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invoice_covers_all_open_entries() {
        let (_dir, router, _) = router(&[], SqlPolicy::default()).await;
        router.apply(add_student("jane", 20.0), &mut NonInteractive).await.unwrap();
        for (hours, date) in [(2.0, "2024-03-01"), (3.0, "2024-03-02"), (1.5, "2024-03-03")] {
            router
                .apply(add_entry("JANE", hours, date), &mut NonInteractive)
                .await
                .unwrap();
        }

        let outcome = router.apply(generate("jan"), &mut NonInteractive).await.unwrap();
        match outcome {
            Outcome::InvoiceGenerated { invoice, entries, .. } => {
                assert_eq!(entries, 3);
                assert!((invoice.total_amount - 130.0).abs() < f64::EPSILON);
                assert_eq!(invoice.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
                assert_eq!(invoice.end_date, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
            }
            other => panic!("expected invoice_generated, got {other:?}"),
        }
        assert_eq!(router.db.count_invoices().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn request_runs_query_and_summarizes() {
        let (_dir, router, script) = router(
            &[
                r#"{"request": "names", "sql_query": "SELECT name FROM students ORDER BY id"}"#,
                "Anna and Bob.",
            ],
            SqlPolicy::default(),
        )
        .await;
        router.apply(add_student("anna", 20.0), &mut NonInteractive).await.unwrap();
        router.apply(add_student("bob", 20.0), &mut NonInteractive).await.unwrap();

        let outcome = router.handle_request("who are my students?").await.unwrap();

        match outcome {
            Outcome::QueryAnswered { result, summary, .. } => {
                assert_eq!(result.columns, vec!["name"]);
                assert_eq!(
                    result.rows,
                    vec![vec![serde_json::json!("anna")], vec![serde_json::json!("bob")]]
                );
                assert_eq!(summary, "Anna and Bob.");
            }
            other => panic!("expected query_answered, got {other:?}"),
        }
        assert_eq!(script.calls(), 2);

        let seen = script.0.lock().unwrap();
        assert!(seen.requests[1].messages[1].content.contains("anna"));
    }

    #[tokio::test]
    async fn failed_query_skips_summarization() {
        let (_dir, router, script) = router(
            &[r#"{"sql_query": "SELECT nope FROM nowhere"}"#, "should not be asked"],
            SqlPolicy::default(),
        )
        .await;

        let err = router.handle_request("anything").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFault);
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn reply_without_sql_is_malformed() {
        let (_dir, router, script) =
            router(&[r#"{"request": "anything"}"#], SqlPolicy::default()).await;

        let err = router.handle_request("anything").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDirective);
        assert!(err.to_string().contains("No SQL query provided"));
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn read_only_policy_blocks_writes() {
        let (_dir, router, script) = router(
            &[r#"{"sql_query": "DELETE FROM students"}"#],
            SqlPolicy::ReadOnly,
        )
        .await;
        router.apply(add_student("anna", 20.0), &mut NonInteractive).await.unwrap();

        let err = router.handle_request("forget everyone").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFault);
        assert_eq!(router.db.count_students().await.unwrap(), 1);
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn stacked_sql_fails_without_running_or_summarizing() {
        let (_dir, router, script) = router(
            &[r#"{"sql_query": "SELECT name FROM students; DELETE FROM students"}"#],
            SqlPolicy::Unrestricted,
        )
        .await;
        router.apply(add_student("anna", 20.0), &mut NonInteractive).await.unwrap();

        let err = router.handle_request("names, then tidy up").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StorageFault);
        assert!(err.to_string().contains("multiple statements"));
        assert_eq!(router.db.count_students().await.unwrap(), 1);
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn failure_is_traced_inside_the_directive_span() {
        let (logs, _guard) = capture_logs();
        let (_dir, router, _) = router(&[], SqlPolicy::default()).await;

        let err = router.handle_request("anything").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelFault);

        let text = logs.text();
        let failed = text
            .lines()
            .find(|line| line.contains("failed"))
            .unwrap_or_else(|| panic!("no failed event in:\n{text}"));
        assert!(failed.contains("directive{"), "{failed}");
        assert!(failed.contains("kind=model_fault"), "{failed}");
        assert_eq!(text.matches("kind=").count(), 1, "{text}");
    }

    #[tokio::test]
    async fn success_is_traced_inside_the_directive_span() {
        let (logs, _guard) = capture_logs();
        let (_dir, router, _) = router(
            &[r#"{"function": "add_student", "args": {"name": "jane", "per_hour_rate": 20, "subject": "math"}}"#],
            SqlPolicy::default(),
        )
        .await;

        router
            .execute_prompt("add jane", &mut NonInteractive)
            .await
            .unwrap();

        let text = logs.text();
        assert!(
            text.lines()
                .any(|line| line.contains("directive{") && line.contains("succeeded")),
            "{text}"
        );
        assert!(!text.contains("kind="), "{text}");
    }

    #[test]
    fn outcome_is_tagged() {
        let outcome = Outcome::QueryAnswered {
            request: "r".into(),
            sql_query: "SELECT 1".into(),
            result: QueryResult::default(),
            summary: "s".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "query_answered");
        assert_eq!(json["sql_query"], "SELECT 1");
    }
}
