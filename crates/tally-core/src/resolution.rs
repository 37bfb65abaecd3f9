//! Outcomes of resolving a free-text student reference.

use serde::Serialize;

use crate::entities::Student;
use crate::errors::CoreError;

/// Result of matching a name fragment against stored students.
///
/// `Ambiguous` candidates are in database (id) order; selections index into
/// that order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "students", rename_all = "snake_case")]
pub enum Resolution {
    NotFound,
    Unique(Student),
    Ambiguous(Vec<Student>),
}

impl Resolution {
    /// Build a resolution from the ordered list of matches.
    #[must_use]
    pub fn from_matches(mut matches: Vec<Student>) -> Self {
        match matches.len() {
            0 => Self::NotFound,
            1 => Self::Unique(matches.remove(0)),
            _ => Self::Ambiguous(matches),
        }
    }

    /// Collapse to a single student without interaction.
    ///
    /// # Errors
    ///
    /// `NotFound` for zero matches, `Ambiguous` listing candidate names for
    /// several.
    pub fn into_unique(self, fragment: &str) -> Result<Student, CoreError> {
        match self {
            Self::Unique(student) => Ok(student),
            Self::NotFound => Err(CoreError::NotFound {
                fragment: fragment.to_string(),
            }),
            Self::Ambiguous(candidates) => Err(CoreError::Ambiguous {
                fragment: fragment.to_string(),
                candidates: candidates.into_iter().map(|s| s.name).collect(),
            }),
        }
    }
}

/// Map a 1-based selection back to the corresponding candidate.
///
/// # Errors
///
/// Returns `CoreError::InvalidSelection` when `choice` is outside
/// `1..=candidates.len()`.
pub fn select_candidate(mut candidates: Vec<Student>, choice: usize) -> Result<Student, CoreError> {
    if choice == 0 || choice > candidates.len() {
        return Err(CoreError::InvalidSelection {
            choice: choice.to_string(),
            count: candidates.len(),
        });
    }
    Ok(candidates.swap_remove(choice - 1))
}
