//! Choosing between several students that match a name fragment.

use std::io::{self, BufRead, Write};

use tally_core::CoreError;
use tally_core::entities::Student;
use tally_core::resolution::{Resolution, select_candidate};

/// Picks one student out of an ambiguous match.
///
/// `candidates` arrive in id order; implementations return one of them or
/// an error, and must not touch the ledger.
pub trait Disambiguator {
    /// # Errors
    ///
    /// Returns a `CoreError` when no valid choice is made.
    fn choose(&mut self, fragment: &str, candidates: Vec<Student>) -> Result<Student, CoreError>;
}

/// Lists the candidates and reads a 1-based number.
pub struct PromptPicker<R, W> {
    input: R,
    output: W,
}

impl PromptPicker<io::StdinLock<'static>, io::Stderr> {
    /// Read from stdin, list on stderr so stdout stays JSON.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptPicker<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, fragment: &str, candidates: &[Student]) -> io::Result<String> {
        writeln!(self.output, "More than one match found for '{fragment}':")?;
        for (i, student) in candidates.iter().enumerate() {
            writeln!(self.output, "{}) {}", i + 1, student.name)?;
        }
        write!(self.output, "Enter the number of the correct student: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Disambiguator for PromptPicker<R, W> {
    fn choose(&mut self, fragment: &str, candidates: Vec<Student>) -> Result<Student, CoreError> {
        let answer = self
            .ask(fragment, &candidates)
            .map_err(|e| CoreError::Other(e.into()))?;

        let Ok(choice) = answer.parse::<usize>() else {
            return Err(CoreError::InvalidSelection {
                choice: answer,
                count: candidates.len(),
            });
        };
        select_candidate(candidates, choice)
    }
}

/// Refuses to choose; an ambiguous match becomes an error.
pub struct NonInteractive;

impl Disambiguator for NonInteractive {
    fn choose(&mut self, fragment: &str, candidates: Vec<Student>) -> Result<Student, CoreError> {
        Resolution::Ambiguous(candidates).into_unique(fragment)
    }
}
