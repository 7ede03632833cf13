//! In-memory content store.
//!
//! Behaves like the management API where it matters to reconciliation:
//! version counters advance on every write, updates are rejected when the
//! submitted snapshot is stale, and published entries must be unpublished
//! before they can be archived or deleted.
//!
//! ```
//! use docsync_core::ReferenceId;
//! use docsync_store::{ContentStore, EntryPayload, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let id = ReferenceId::from("acme_docs_intro");
//! let created = store
//!     .create_entry_with_id("doc", &id, &EntryPayload::default())
//!     .unwrap();
//! assert_eq!(created.version(), 1);
//! assert!(store.get_entry(&id).is_ok());
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use docsync_core::{ReferenceId, TagId};

use crate::error::StoreError;
use crate::model::{Entry, EntryPayload, EntrySys, Link, Tag};
use crate::ContentStore;

/// User id stamped into `sys.updatedBy` by this store.
pub const MEMORY_USER: &str = "memory-store";

/// Thread-safe in-memory store; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, Entry>,
    tags: BTreeMap<String, Tag>,
    failures: Vec<FailOn>,
    operations: Vec<StoreOperation>,
    latency: Option<Duration>,
}

/// Operation that should fail, with the error to return.
///
/// Failures stay armed until [`MemoryStore::clear_failures`].
#[derive(Debug, Clone)]
pub enum FailOn {
    GetEntry(StoreError),
    CreateEntry(StoreError),
    UpdateEntry(StoreError),
    PublishEntry(StoreError),
    UnpublishEntry(StoreError),
    ArchiveEntry(StoreError),
    DeleteEntry(StoreError),
    ListTags(StoreError),
    CreateTag(StoreError),
}

/// Recorded call, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    GetEntry { id: String },
    CreateEntry { content_type: String, id: String },
    UpdateEntry { id: String, version: u64 },
    PublishEntry { id: String },
    UnpublishEntry { id: String },
    ArchiveEntry { id: String },
    DeleteEntry { id: String },
    ListTags,
    CreateTag { id: String, name: String },
}

impl StoreOperation {
    /// Whether the call changes remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            StoreOperation::GetEntry { .. } | StoreOperation::ListTags
        )
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing entries.
    pub fn with_entries(entries: Vec<Entry>) -> Self {
        let store = Self::new();
        for entry in entries {
            store.insert_entry(entry);
        }
        store
    }

    /// Arm a failure for one operation kind.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().failures.push(fail_on);
        self
    }

    /// Sleep this long inside every call, outside the lock.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Insert or replace an entry without recording an operation.
    pub fn insert_entry(&self, entry: Entry) {
        self.lock().entries.insert(entry.sys.id.clone(), entry);
    }

    pub fn insert_tag(&self, tag: Tag) {
        self.lock().tags.insert(tag.sys.id.clone(), tag);
    }

    /// Current state of an entry, without recording an operation.
    pub fn entry(&self, id: &str) -> Option<Entry> {
        self.lock().entries.get(id).cloned()
    }

    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.lock().tags.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `op`, wait out the configured latency, then return any armed
    /// failure for it.
    fn enter(&self, op: StoreOperation) -> Result<(), StoreError> {
        let latency = {
            let mut inner = self.lock();
            inner.operations.push(op.clone());
            inner.latency
        };
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }

        let inner = self.lock();
        let armed = inner.failures.iter().find_map(|failure| match (failure, &op) {
            (FailOn::GetEntry(e), StoreOperation::GetEntry { .. })
            | (FailOn::CreateEntry(e), StoreOperation::CreateEntry { .. })
            | (FailOn::UpdateEntry(e), StoreOperation::UpdateEntry { .. })
            | (FailOn::PublishEntry(e), StoreOperation::PublishEntry { .. })
            | (FailOn::UnpublishEntry(e), StoreOperation::UnpublishEntry { .. })
            | (FailOn::ArchiveEntry(e), StoreOperation::ArchiveEntry { .. })
            | (FailOn::DeleteEntry(e), StoreOperation::DeleteEntry { .. })
            | (FailOn::ListTags(e), StoreOperation::ListTags)
            | (FailOn::CreateTag(e), StoreOperation::CreateTag { .. }) => Some(e.clone()),
            _ => None,
        });
        match armed {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Apply `change` to the stored entry after checking the snapshot's version.
    fn write<F>(&self, snapshot: &Entry, change: F) -> Result<Entry, StoreError>
    where
        F: FnOnce(&mut Entry) -> Result<(), StoreError>,
    {
        let mut inner = self.lock();
        let stored = inner
            .entries
            .get_mut(snapshot.id())
            .ok_or_else(|| StoreError::NotFound(snapshot.id().to_string()))?;
        if stored.sys.version != snapshot.sys.version {
            return Err(StoreError::VersionConflict(format!(
                "entry {} is at version {}, update was based on version {}",
                snapshot.id(),
                stored.sys.version,
                snapshot.sys.version
            )));
        }
        change(stored)?;
        stored.sys.version += 1;
        stored.sys.updated_at = Some(Utc::now());
        stored.sys.updated_by = Some(Link::new("User", MEMORY_USER));
        Ok(stored.clone())
    }
}

impl ContentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_entry(&self, id: &ReferenceId) -> Result<Entry, StoreError> {
        self.enter(StoreOperation::GetEntry {
            id: id.to_string(),
        })?;
        self.lock()
            .entries
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("entry {id}")))
    }

    fn create_entry_with_id(
        &self,
        content_type: &str,
        id: &ReferenceId,
        payload: &EntryPayload,
    ) -> Result<Entry, StoreError> {
        self.enter(StoreOperation::CreateEntry {
            content_type: content_type.to_string(),
            id: id.to_string(),
        })?;

        let mut inner = self.lock();
        if inner.entries.contains_key(id.as_str()) {
            return Err(StoreError::VersionConflict(format!(
                "entry {id} already exists"
            )));
        }
        let now = Utc::now();
        let entry = Entry {
            sys: EntrySys {
                version: 1,
                content_type: Some(Link::new("ContentType", content_type)),
                created_at: Some(now),
                updated_at: Some(now),
                updated_by: Some(Link::new("User", MEMORY_USER)),
                ..EntrySys::new(id.as_str())
            },
            fields: payload.fields.clone(),
            metadata: payload.metadata.clone(),
        };
        inner.entries.insert(id.to_string(), entry.clone());
        Ok(entry)
    }

    fn update_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        self.enter(StoreOperation::UpdateEntry {
            id: entry.id().to_string(),
            version: entry.version(),
        })?;
        self.write(entry, |stored| {
            stored.fields = entry.fields.clone();
            stored.metadata = entry.metadata.clone();
            Ok(())
        })
    }

    fn publish_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        self.enter(StoreOperation::PublishEntry {
            id: entry.id().to_string(),
        })?;
        self.write(entry, |stored| {
            if stored.is_archived() {
                return Err(StoreError::Api {
                    status: 422,
                    message: "cannot publish an archived entry".to_string(),
                });
            }
            stored.sys.published_version = Some(stored.sys.version);
            Ok(())
        })
    }

    fn unpublish_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        self.enter(StoreOperation::UnpublishEntry {
            id: entry.id().to_string(),
        })?;
        self.write(entry, |stored| {
            if !stored.is_published() {
                return Err(StoreError::Api {
                    status: 400,
                    message: "entry is not published".to_string(),
                });
            }
            stored.sys.published_version = None;
            Ok(())
        })
    }

    fn archive_entry(&self, entry: &Entry) -> Result<Entry, StoreError> {
        self.enter(StoreOperation::ArchiveEntry {
            id: entry.id().to_string(),
        })?;
        self.write(entry, |stored| {
            if stored.is_published() {
                return Err(StoreError::Api {
                    status: 422,
                    message: "cannot archive a published entry".to_string(),
                });
            }
            stored.sys.archived_version = Some(stored.sys.version);
            Ok(())
        })
    }

    fn delete_entry(&self, entry: &Entry) -> Result<(), StoreError> {
        self.enter(StoreOperation::DeleteEntry {
            id: entry.id().to_string(),
        })?;
        let mut inner = self.lock();
        let stored = inner
            .entries
            .get(entry.id())
            .ok_or_else(|| StoreError::NotFound(format!("entry {}", entry.id())))?;
        if stored.sys.version != entry.sys.version {
            return Err(StoreError::VersionConflict(format!(
                "entry {} is at version {}, delete was based on version {}",
                entry.id(),
                stored.sys.version,
                entry.sys.version
            )));
        }
        if stored.is_published() {
            return Err(StoreError::Api {
                status: 422,
                message: "cannot delete a published entry".to_string(),
            });
        }
        inner.entries.remove(entry.id());
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        self.enter(StoreOperation::ListTags)?;
        Ok(self.tags())
    }

    fn create_tag(&self, id: &TagId, name: &str) -> Result<Tag, StoreError> {
        self.enter(StoreOperation::CreateTag {
            id: id.to_string(),
            name: name.to_string(),
        })?;
        let mut inner = self.lock();
        if inner.tags.contains_key(id.as_str()) {
            return Err(StoreError::Api {
                status: 422,
                message: format!("tag {id} already exists"),
            });
        }
        let mut tag = Tag::new(id.as_str(), name);
        tag.sys.version = Some(1);
        inner.tags.insert(id.to_string(), tag.clone());
        Ok(tag)
    }
}
