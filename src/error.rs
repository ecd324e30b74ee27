//! Error types for filedock.

use thiserror::Error;

/// Common error type for filedock.
#[derive(Error, Debug)]
pub enum FiledockError {
    /// Database error.
    ///
    /// Wraps errors from the sqlx backend; converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error (blob storage, log files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (missing or invalid identity).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Blob storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FiledockError {
    fn from(e: sqlx::Error) -> Self {
        FiledockError::Database(e.to_string())
    }
}

/// Result type alias for filedock operations.
pub type Result<T> = std::result::Result<T, FiledockError>;
