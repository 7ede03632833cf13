//! Source tag bookkeeping, run once per batch before any document.

use docsync_store::ContentStore;

use crate::error::SyncError;
use crate::identity::source_tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStatus {
    Existing,
    Created,
    /// Dry run: the tag is missing and would be created.
    WouldCreate,
}

/// Make sure the repository's source tag exists.
///
/// Any store failure aborts the batch as [`SyncError::TagBookkeeping`].
pub fn ensure_source_tag(
    store: &dyn ContentStore,
    repository: &str,
    dry_run: bool,
) -> Result<TagStatus, SyncError> {
    let (id, name) = source_tag(repository);
    let bookkeeping = |source| SyncError::TagBookkeeping {
        tag: id.to_string(),
        source,
    };

    let tags = store.list_tags().map_err(bookkeeping)?;
    if tags.iter().any(|tag| tag.id() == id.as_str()) {
        tracing::debug!("tag {id} already exists");
        return Ok(TagStatus::Existing);
    }
    if dry_run {
        tracing::info!("[dry-run] would create tag {id}");
        return Ok(TagStatus::WouldCreate);
    }

    store.create_tag(&id, &name).map_err(bookkeeping)?;
    tracing::info!("created tag {id} ({name})");
    Ok(TagStatus::Created)
}
