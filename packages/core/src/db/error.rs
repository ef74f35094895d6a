//! Store Error Types
//!
//! Errors raised by `NodeStore` implementations. The engine surfaces every
//! variant as `TreeError::StoreUnavailable`; none of them leave a partially
//! applied batch behind.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend cannot serve the request right now
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Operation did not complete within the configured timeout
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Filesystem failure for file-backed stores
    #[error("Failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Persisted contents could not be encoded or decoded
    #[error("Store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
