//! Error types for docsync-sync.
//!
//! Only setup failures surface here. Per-document store failures are
//! recorded as [`crate::Outcome::Failed`] and never escape a batch.

use std::path::PathBuf;

use thiserror::Error;

use docsync_core::ConfigError;
use docsync_store::StoreError;

/// All errors that can abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store client could not be constructed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Listing or creating the source tag failed; no document was processed.
    #[error("tag bookkeeping failed for '{tag}': {source}")]
    TagBookkeeping {
        tag: String,
        #[source]
        source: StoreError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A reconciliation task panicked or was cancelled.
    #[error("sync task failed: {0}")]
    Task(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
