//! Validation error types

use std::fmt;

/// Caller-supplied input rejected before any statement reaches the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// User id of zero never refers to a stored user
    ZeroUserId,

    /// Table name outside the allow-list
    UnknownTable { value: String },

    /// Field key that the table does not declare as a data column
    UnknownColumn { table: &'static str, column: String },

    /// Field key naming a column the engine manages itself
    ReservedColumn { column: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::ZeroUserId => write!(f, "user_id must be specified"),
            Self::UnknownTable { value } => write!(f, "unknown table '{}'", value),
            Self::UnknownColumn { table, column } => {
                write!(f, "table {} has no data column '{}'", table, column)
            }
            Self::ReservedColumn { column } => {
                write!(f, "column '{}' is managed by the store and cannot be set", column)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
