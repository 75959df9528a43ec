//! Query error types
//!
//! Error codes:
//! - QUERY_INVALID_FIELD: field path does not resolve against the folder
//! - QUERY_INVALID_OPERATION: operation precondition not met
//! - QUERY_DOES_NOT_EXIST: `get()` matched nothing
//! - QUERY_MULTIPLE_RESULTS: `get()` matched more than one item
//! - QUERY_OUT_OF_RANGE: index outside the result
//! - QUERY_INVALID_CONFIG: configuration rejected
//! - QUERY_FOLDER_FAILED: failure raised by the folder, passed through

use thiserror::Error;

use crate::folder::FolderError;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Query errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Unresolvable field path
    #[error("Invalid field path '{path}'{context}: {reason}")]
    InvalidField {
        path: String,
        reason: String,
        /// Operation the path was given to, e.g. " in only()"
        context: String,
    },

    /// Operation not valid for the current query
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// `get()` found nothing
    #[error("Query returned no results")]
    DoesNotExist,

    /// `get()` found more than one result
    #[error("Query returned {count} results, expected exactly one")]
    MultipleObjectsReturned { count: usize },

    /// Index outside the result
    #[error("Index {index} is out of range")]
    OutOfRange { index: isize },

    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure raised by the folder
    #[error(transparent)]
    Folder(#[from] FolderError),
}

impl QueryError {
    /// Create an invalid field error
    pub fn invalid_field(path: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidField {
            path: path.into(),
            reason: reason.into(),
            context: String::new(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        QueryError::InvalidOperation(reason.into())
    }

    /// Names the chaining operation an invalid field was passed to
    pub fn in_operation(self, operation: &str) -> Self {
        match self {
            QueryError::InvalidField { path, reason, .. } => QueryError::InvalidField {
                path,
                reason,
                context: format!(" in {}()", operation),
            },
            other => other,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidField { .. } => "QUERY_INVALID_FIELD",
            QueryError::InvalidOperation(_) => "QUERY_INVALID_OPERATION",
            QueryError::DoesNotExist => "QUERY_DOES_NOT_EXIST",
            QueryError::MultipleObjectsReturned { .. } => "QUERY_MULTIPLE_RESULTS",
            QueryError::OutOfRange { .. } => "QUERY_OUT_OF_RANGE",
            QueryError::InvalidConfig(_) => "QUERY_INVALID_CONFIG",
            QueryError::Folder(_) => "QUERY_FOLDER_FAILED",
        }
    }

    /// True for failures raised by the folder rather than by local validation
    pub fn is_remote(&self) -> bool {
        matches!(self, QueryError::Folder(_))
    }
}
