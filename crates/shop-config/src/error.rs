//! Error types for shop-config

use std::path::PathBuf;

/// Result type for shop-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, composing or saving a sync document
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML for the sync schema
    #[error("Failed to parse config at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize config for {path}: {message}")]
    Serialize { path: PathBuf, message: String },

    /// The document parsed but violates a schema rule
    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// An included document could not be loaded or merged
    #[error("Error while reading included config {path}: {source}")]
    Include {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Include cycle detected at {path}")]
    IncludeCycle { path: PathBuf },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn include(path: impl Into<PathBuf>, source: Error) -> Self {
        Self::Include {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub fn invalid(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            message: message.into(),
        }
    }
}
