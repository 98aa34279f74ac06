//! Mock service error types

use thiserror::Error;

use crate::mock::coordinates::Coordinates;
use crate::storage::StorageError;

/// Errors raised by the mock resources.
#[derive(Debug, Error)]
pub enum MockError {
    /// the document store rejected a query or a batch
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// the resource has no node in the document
    #[error("not found: {0}")]
    NotFound(String),

    /// a repository with these coordinates is already there
    #[error("repository already exists: {0}")]
    RepoExists(Coordinates),

    /// coordinates not of the form `user/repo`
    #[error("invalid coordinates: {0:?}")]
    InvalidCoordinates(String),

    /// a patch that is not a JSON object of strings
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
}

impl MockError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, MockError::NotFound(_))
    }
}

/// result type alias for mock operations
pub type MockResult<T> = Result<T, MockError>;
