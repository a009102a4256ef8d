//! Error types for hrsync-store.

use std::path::PathBuf;

use thiserror::Error;

use hrsync_core::EntityKind;

/// All errors that can arise from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entity arrived without its natural key.
    #[error("{kind} has an empty natural key")]
    MissingKey { kind: EntityKind },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
