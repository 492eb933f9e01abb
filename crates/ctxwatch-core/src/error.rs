//! Error type for namespace storage operations.
//!
//! None of these errors ever reach the host: every component maps them to
//! its degraded output before returning.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised by [`Namespace`](crate::store::Namespace) operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The session key is empty, too long, or contains unsafe characters
    #[error("invalid session key: {key:?}")]
    InvalidKey { key: String },

    /// A filesystem operation failed
    #[error("{action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored object exists but its content is not a valid record
    #[error("malformed record at {path:?}")]
    Parse { path: PathBuf },

    /// The record naming pattern could not be compiled
    #[error("invalid record name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Whether this error means "nothing stored yet" rather than a real failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Result alias for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
