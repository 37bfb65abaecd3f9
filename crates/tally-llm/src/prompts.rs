//! System messages sent to the model.

/// Function-call mode: lists the three ledger actions and the reply shape.
pub const FUNCTION_CATALOGUE: &str = r#"You turn a tutor's notes into one call against an invoice ledger.
Reply with a single JSON object of the form {"function": "<name>", "args": {...}} and nothing else.
Do not put comments inside the JSON.

Available functions:

add_student
  Register a new student.
  args: {"name": string, "per_hour_rate": number, "subject": string}

add_invoice_entry
  Record a tutoring session for an existing student.
  args: {"student_name": string, "num_hours": number,
         "session_date": "YYYY-MM-DD" or "NULL" when no date is mentioned,
         "comments": string, empty unless the note says something specific}

generate_invoice
  Bill a student for every session since their last invoice.
  args: {"student_name": string}
"#;

/// Free-form query mode. `{request}` is replaced with the user's text.
pub const SQL_QUERY_TEMPLATE: &str = r#"You write SQLite queries against this schema:

students
  id INTEGER PRIMARY KEY
  name TEXT UNIQUE NOT NULL          -- stored lowercase
  per_hour_rate REAL NOT NULL
  subject TEXT NOT NULL              -- stored lowercase
  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP

invoice_entries
  id INTEGER PRIMARY KEY
  student_id INTEGER REFERENCES students(id)
  num_hours REAL NOT NULL
  subject TEXT NOT NULL              -- copied from the student
  session_date DATE DEFAULT CURRENT_DATE
  comments TEXT
  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP

generated_invoices
  id INTEGER PRIMARY KEY
  student_id INTEGER REFERENCES students(id)
  subject TEXT NOT NULL
  num_hours REAL NOT NULL
  total_amount REAL NOT NULL
  start_date DATE NOT NULL
  end_date DATE NOT NULL
  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP

Write one query answering: "{request}"

Reply with a JSON object only, for example:
{"request": "List every student's name.", "sql_query": "SELECT name FROM students;"}
"#;

/// Summarization mode.
pub const RESULT_PRESENTATION: &str = "You are given a question about a tutoring ledger and the raw rows a database returned for it. \
Answer the question from those rows, briefly and in plain language.";

/// Fill the query template with the user's request.
#[must_use]
pub fn sql_query_prompt(request: &str) -> String {
    SQL_QUERY_TEMPLATE.replace("{request}", request)
}

/// User message for the summarization call.
#[must_use]
pub fn result_message(request: &str, results: &str) -> String {
    format!("Request: {request}\nResults: {results}")
}
