//! Error types for activity-calendar operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// The repeat-rule string could not be parsed. Carries the offending rule.
    #[error("Invalid repeat rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// The series definition is unusable (e.g. zero duration).
    #[error("Invalid series '{id}': {reason}")]
    InvalidSeries { id: String, reason: String },

    #[error("Invalid occurrence key: {0}")]
    InvalidOccurrenceKey(String),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
