// Error types for task operations

use chrono::NaiveDate;
use thiserror::Error;

/// Rejected input. The operation that returned it had no effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task text cannot be empty")]
    EmptyText,

    #[error("Due date {due} is in the past; pick {today} or a later date")]
    DueDateInPast { due: NaiveDate, today: NaiveDate },
}

/// Errors returned by [`crate::TaskStore`] operations
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task id '{prefix}' is ambiguous ({matches} tasks match)")]
    AmbiguousId { prefix: String, matches: usize },

    #[error("Failed to persist tasks: {0:#}")]
    Storage(eyre::Report),
}

impl TaskError {
    /// True for rejected input, as opposed to lookup or storage failures
    pub fn is_validation(&self) -> bool {
        matches!(self, TaskError::Validation(_))
    }
}
