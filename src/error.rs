//! Error types for apib-recorder

use std::io;
use thiserror::Error;

/// Result type for apib-recorder operations
pub type Result<T> = std::result::Result<T, ApibError>;

/// Error type handlers return to the framework.
///
/// The recording middleware passes it through untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in apib-recorder
#[derive(Debug, Error)]
pub enum ApibError {
    /// Blueprint file could not be created
    #[error("Can't create file {path}: {source}")]
    CreateFile {
        /// Path of the file that failed
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Request body could not be drained
    #[error("Failed to read body: {0}")]
    BodyRead(String),

    /// Process-wide state was configured twice
    #[error("Recorder already initialized")]
    AlreadyInitialized,
}
