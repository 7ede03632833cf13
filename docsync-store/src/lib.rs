//! Content store adapters for docsync.
//!
//! # Design
//!
//! [`ContentStore`] is the only seam between reconciliation and the remote
//! CMS. It is synchronous: the sync driver runs each call on a blocking task,
//! so adapters can use a plain blocking HTTP client.
//!
//! - [`contentful::ContentfulStore`]: Contentful Management API over `ureq`.
//! - [`memory::MemoryStore`]: in-memory store with recorded operations and
//!   injectable failures.
//!
//! No adapter retries. A failed call is reported to the caller as-is.

pub mod contentful;
pub mod error;
pub mod memory;
pub mod model;

use docsync_core::{ReferenceId, TagId};

pub use contentful::ContentfulStore;
pub use error::StoreError;
pub use memory::{FailOn, MemoryStore, StoreOperation};
pub use model::{Entry, EntryPayload, EntrySys, Fields, Link, Metadata, Tag};

/// Entry and tag operations against a remote content store.
///
/// Every mutating entry call takes the snapshot it was derived from; the
/// snapshot's `sys.version` is sent as the optimistic-concurrency guard.
pub trait ContentStore: Send + Sync {
    /// Adapter name, for logs.
    fn name(&self) -> &'static str;

    /// Fetch an entry. A missing entry is `StoreError::NotFound`.
    fn get_entry(&self, id: &ReferenceId) -> Result<Entry, StoreError>;

    /// Create an entry under a caller-chosen id.
    fn create_entry_with_id(
        &self,
        content_type: &str,
        id: &ReferenceId,
        payload: &EntryPayload,
    ) -> Result<Entry, StoreError>;

    /// Submit a mutated snapshot. Fails with `VersionConflict` when the
    /// store moved past `entry.sys.version`.
    fn update_entry(&self, entry: &Entry) -> Result<Entry, StoreError>;

    fn publish_entry(&self, entry: &Entry) -> Result<Entry, StoreError>;

    fn unpublish_entry(&self, entry: &Entry) -> Result<Entry, StoreError>;

    fn archive_entry(&self, entry: &Entry) -> Result<Entry, StoreError>;

    fn delete_entry(&self, entry: &Entry) -> Result<(), StoreError>;

    fn list_tags(&self) -> Result<Vec<Tag>, StoreError>;

    fn create_tag(&self, id: &TagId, name: &str) -> Result<Tag, StoreError>;
}
