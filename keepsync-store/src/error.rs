//! Error types for keepsync-store
//!
//! Store-level failures are classified once, in [`KeeperError::from_sqlx`],
//! and always carry the name of the operation that produced them.

use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::models::ValidationError;

/// Result type alias for keepsync-store operations
pub type Result<T> = std::result::Result<T, KeeperError>;

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum KeeperError {
    /// Missing or invalid connection settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The store could not be reached; callers may retry with backoff
    #[error("{op}: connection failed: {source}")]
    ConnectionFailed {
        op: &'static str,
        source: sqlx::Error,
    },

    /// Lookup yielded no row
    #[error("not found: {resource} '{key}'")]
    NotFound { resource: &'static str, key: String },

    /// Uniqueness, foreign-key, not-null or check constraint rejected the write
    #[error("{op}: constraint violation: {source}")]
    ConstraintViolation {
        op: &'static str,
        source: sqlx::Error,
    },

    /// Caller input rejected before any I/O
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// Any other error reported by the store
    #[error("{op}: {source}")]
    IoFailure {
        op: &'static str,
        source: sqlx::Error,
    },

    /// Live catalog does not match the record table convention
    #[error("schema mismatch for table {table}: {reason}")]
    SchemaMismatch { table: String, reason: String },

    /// Column type the row decoder cannot render as text
    #[error("unsupported datatype {type_name} in column {column}")]
    UnsupportedDatatype { column: String, type_name: String },

    /// Operation cancelled through its context
    #[error("{op}: operation cancelled")]
    Cancelled { op: &'static str },

    /// Operation outlived its context deadline
    #[error("{op}: deadline exceeded")]
    DeadlineExceeded { op: &'static str },

    /// Migration lookup or execution failed
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl KeeperError {
    /// Classify a sqlx error raised while running `op`.
    pub fn from_sqlx(op: &'static str, source: sqlx::Error) -> Self {
        match &source {
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => Self::ConstraintViolation { op, source },
                _ => Self::IoFailure { op, source },
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionFailed { op, source },
            _ => Self::IoFailure { op, source },
        }
    }

    /// Shorthand for a not-found lookup
    pub fn not_found(resource: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            key: key.into(),
        }
    }

    /// Shorthand for a catalog mismatch
    pub fn schema_mismatch(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// True for failures a caller may reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::DeadlineExceeded { .. }
        )
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ConnectionFailed { .. } => "CONNECTION_FAILED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ConstraintViolation { .. } => "CONSTRAINT_VIOLATION",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::IoFailure { .. } => "IO_FAILURE",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::UnsupportedDatatype { .. } => "UNSUPPORTED_DATATYPE",
            Self::Cancelled { .. } => "CANCELLED",
            Self::DeadlineExceeded { .. } => "DEADLINE_EXCEEDED",
            Self::Migration(_) => "MIGRATION_FAILED",
        }
    }
}
