//! Error types for aguia-core

use thiserror::Error;

/// Result type alias using aguia-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in aguia-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller lacks the capability for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A remote preference service could not be reached or refused the call
    #[error("Remote service error: {0}")]
    Remote(String),
}
