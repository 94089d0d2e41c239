//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the storage adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the state file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but is not a valid document.
    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory snapshot could not be serialized.
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
