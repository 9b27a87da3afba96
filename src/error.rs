//! Error types for engine operations

use thiserror::Error;

/// Errors that can occur during engine operations
///
/// Every validation failure is detected before any SQL executes; only
/// `QueryExecutionFailed` can surface after a statement has been sent to the
/// driver.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Non-numeric field: {0}")]
    NonNumericField(String),

    #[error("Invalid cursor")]
    InvalidCursor,

    #[error("Duplicate column name: {0}")]
    DuplicateColumnName(String),

    #[error("Migration conflict: {0}")]
    MigrationConflict(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    pub fn migration_conflict(msg: impl Into<String>) -> Self {
        Self::MigrationConflict(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::QueryExecutionFailed(msg.into())
    }

    /// Attach the offending column to a coercion failure
    pub(crate) fn with_column(self, column: &str) -> Self {
        match self {
            Self::InvalidValue(msg) => Self::InvalidValue(format!("column '{column}': {msg}")),
            other => other,
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::QueryExecutionFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
