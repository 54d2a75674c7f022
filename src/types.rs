//! Error types for StartLink

use thiserror::Error;

/// Errors surfaced by the StartLink service
#[derive(Debug, Error)]
pub enum StartlinkError {
    /// HTTP request handling errors (bad bodies, oversized payloads)
    #[error("HTTP error: {0}")]
    Http(String),

    /// MongoDB connection and query errors
    #[error("Database error: {0}")]
    Database(String),

    /// Authentication and token errors
    #[error("Auth error: {0}")]
    Auth(String),

    /// Configuration errors (bad secrets, unusable settings)
    #[error("Config error: {0}")]
    Config(String),

    /// Underlying I/O errors (listener binding, usage log)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, StartlinkError>;
