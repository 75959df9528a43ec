//! Folder collaborator errors
//!
//! These are raised by the store behind a folder. The query layer wraps
//! them unchanged and never retries.

use thiserror::Error;

/// Result type for folder operations
pub type FolderResult<T> = Result<T, FolderError>;

/// Failures reported by a folder or its account
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderError {
    /// No item with this id exists
    #[error("Item '{0}' not found")]
    ItemNotFound(String),

    /// The item exists but its changekey moved on
    #[error("Changekey for item '{0}' is out of date")]
    StaleChangeKey(String),

    /// The request asked for a field the operation cannot return
    #[error("Field '{0}' is not supported by this request")]
    UnsupportedField(String),

    /// The store sent something the folder could not interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Transport or service failure
    #[error("Service error: {0}")]
    Service(String),
}

impl FolderError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FolderError::ItemNotFound(_) => "FOLDER_ITEM_NOT_FOUND",
            FolderError::StaleChangeKey(_) => "FOLDER_STALE_CHANGEKEY",
            FolderError::UnsupportedField(_) => "FOLDER_UNSUPPORTED_FIELD",
            FolderError::MalformedResponse(_) => "FOLDER_MALFORMED_RESPONSE",
            FolderError::Service(_) => "FOLDER_SERVICE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(FolderError::ItemNotFound("x".into()).code(), "FOLDER_ITEM_NOT_FOUND");
        assert_eq!(FolderError::Service("x".into()).code(), "FOLDER_SERVICE_ERROR");
    }

    #[test]
    fn test_error_display() {
        let err = FolderError::UnsupportedField("attachments".into());
        assert!(err.to_string().contains("attachments"));
    }
}
