use clap::{ArgGroup, Parser};

/// Top-level CLI parser for the `tally` binary.
#[derive(Debug, Parser)]
#[command(
    name = "tally",
    version,
    about = "Track tutoring sessions and invoices from plain-language notes"
)]
#[command(group(ArgGroup::new("input").required(true).args(["prompt", "request"])))]
pub struct Cli {
    /// Note describing a ledger action, e.g. "jane did 2 hours of math today"
    pub prompt: Option<String>,

    /// Question to answer from the ledger with a generated SQL query
    #[arg(short, long)]
    pub request: Option<String>,
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Prompt(String),
    Request(String),
}

impl Cli {
    /// The single intent carried by the arguments.
    #[must_use]
    pub fn into_intent(self) -> Intent {
        match self.request {
            Some(request) => Intent::Request(request),
            None => Intent::Prompt(self.prompt.unwrap_or_default()),
        }
    }
}
