//! Error types for batik-scan.

use thiserror::Error;

/// Result type alias using batik-scan's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for batik-scan operations.
///
/// Low-confidence predictions are not errors; they are returned as
/// [`crate::PredictionOutcome::Rejected`].
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found (missing or owned by someone else)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Blob store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Classifier scoring failed or returned an unusable result
    #[error("Inference error: {0}")]
    Inference(String),

    /// Classifier is not loaded and could not be loaded
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (caller fault, never retried)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Bearer credential missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of a remote dependency that a fresh attempt may not hit.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Request(_) | Error::Io(_) | Error::Database(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("History not found".to_string());
        assert_eq!(err.to_string(), "Not found: History not found");
    }

    #[test]
    fn test_error_display_service_unavailable() {
        let err = Error::ServiceUnavailable("model loading failed".to_string());
        assert_eq!(err.to_string(), "Service unavailable: model loading failed");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("bucket unreachable".to_string());
        assert_eq!(err.to_string(), "Storage error: bucket unreachable");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("Failed to process image".to_string());
        assert_eq!(err.to_string(), "Invalid input: Failed to process image");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("Failed to save prediction history".to_string());
        assert_eq!(
            err.to_string(),
            "Internal error: Failed to save prediction history"
        );
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Storage("timeout".into()).is_transient());
        assert!(Error::Request("reset".into()).is_transient());
        assert!(!Error::InvalidInput("bad".into()).is_transient());
        assert!(!Error::NotFound("gone".into()).is_transient());
        assert!(!Error::ServiceUnavailable("down".into()).is_transient());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
