//! Error types for shop-sync

use crate::remote::RemoteError;

/// Result type for shop-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while pushing, pulling or applying
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A domain applier failed; `domain` names which one
    #[error("{domain} sync failed: {source}")]
    Domain {
        domain: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A declared theme does not exist remotely
    #[error("Theme not found: {name}")]
    ThemeNotFound { name: String },

    /// A remote record came back without an id
    #[error("Remote {entity} record has no id")]
    MissingId { entity: String },

    /// The run was cancelled by the caller
    #[error("Sync cancelled")]
    Cancelled,

    // Transparent wrappers for underlying crate errors
    /// Remote store error
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Configuration error from shop-config
    #[error(transparent)]
    Config(#[from] shop_config::Error),
}

impl Error {
    pub fn domain(domain: &'static str, source: Error) -> Self {
        Self::Domain {
            domain,
            source: Box::new(source),
        }
    }

    /// Whether this error, or the error it wraps, is a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Domain { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}
