//! Storage layer error types
//!
//! Everything that can go wrong while querying or editing the document.
//! A failed directive batch never leaves a trace in the document, so none of
//! these errors imply a half-written state.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::path::PathError;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// a path expression could not be parsed
    #[error(transparent)]
    Path(#[from] PathError),

    /// a directive of a batch could not be applied
    #[error("directive #{index} ({directive}) failed: {reason}")]
    Directive {
        index: usize,
        directive: String,
        reason: String,
    },

    /// element or attribute name that is not a valid XML name
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// a snapshot on disk could not be understood
    #[error("corrupted snapshot at {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// check if this error comes from a malformed path expression
    pub fn is_path(&self) -> bool {
        matches!(self, StorageError::Path(_))
    }

    /// check if this error was raised while applying a batch
    pub fn is_directive(&self) -> bool {
        matches!(self, StorageError::Directive { .. } | StorageError::InvalidName(_))
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let path: StorageError = "/github/[".parse::<crate::storage::Path>().unwrap_err().into();
        assert!(path.is_path());
        assert!(!path.is_directive());

        let directive = StorageError::Directive {
            index: 2,
            directive: "UP".to_string(),
            reason: "already at the document".to_string(),
        };
        assert!(directive.is_directive());
        assert_eq!(
            directive.to_string(),
            "directive #2 (UP) failed: already at the document"
        );
    }
}
