//! Error types for docsync-store.

use thiserror::Error;

/// Errors from content store operations.
///
/// Variants carry plain strings so results can be cloned into outcome logs
/// and replayed by [`crate::memory::MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested entry or tag does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store's version advanced since the snapshot was fetched.
    #[error("version conflict: {0}")]
    VersionConflict(String),

    /// Token rejected or lacking permission.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Connection, DNS, TLS, or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// A success response whose body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The client could not be constructed from configuration.
    #[error("store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
