//! Storage error types.

use std::io;
use thiserror::Error;

/// Errors raised by a [`super::Storage`] backend.
///
/// The engine never surfaces these to callers; they are logged and the
/// in-memory state stays authoritative.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    /// The key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// The backend is not accepting operations.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// No data directory could be determined for file storage.
    #[error("Failed to determine a data directory")]
    DataDirNotFound,
}

impl StorageError {
    pub(crate) fn io(key: &str, source: io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}
