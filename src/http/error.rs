//! HTTP layer error types.

use thiserror::Error;

/// Result type for request and response operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors raised while building, sending or reading an HTTP exchange.
#[derive(Debug, Error)]
pub enum HttpError {
    /// I/O failure while talking to the remote side.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by a transport implementation.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status the caller did not expect.
    #[error("unexpected status {actual} ({reason}) from {uri}, expected {expected}")]
    UnexpectedStatus {
        expected: u16,
        actual: u16,
        reason: String,
        uri: String,
    },

    /// The response body does not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An argument was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A URI could not be parsed or resolved.
    #[error("invalid uri: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HttpError {
    /// check if this error came from the network exchange itself
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Io(_) | HttpError::Transport(_))
    }

    /// check if this error means the response could not be understood
    pub fn is_malformed(&self) -> bool {
        matches!(self, HttpError::MalformedResponse(_) | HttpError::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let io = HttpError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"));
        assert!(io.is_transport());
        assert!(!io.is_malformed());

        let malformed = HttpError::MalformedResponse("no items".to_string());
        assert!(malformed.is_malformed());
        assert!(!malformed.is_transport());

        let status = HttpError::UnexpectedStatus {
            expected: 200,
            actual: 404,
            reason: "Not Found".to_string(),
            uri: "https://api.github.com/x".to_string(),
        };
        assert!(!status.is_transport());
        assert_eq!(
            status.to_string(),
            "unexpected status 404 (Not Found) from https://api.github.com/x, expected 200"
        );
    }
}
