//! Per-document reconciliation.
//!
//! ## Two steps
//!
//! 1. [`Preparer::prepare`]: parse, validate, and resolve identity. Pure.
//! 2. [`Reconciler::apply`]: the store calls for one prepared document.
//!
//! ## `apply` for a ready document
//!
//! 1. `get_entry(reference_id)`.
//! 2. Found → set the four locale fields on the snapshot → `update_entry`.
//! 3. Not found → seed a payload under the locale → `create_entry_with_id`
//!    → `publish_entry` (best effort).
//! 4. Any other fetch error → `Failed { fetch }`; nothing is created.
//!
//! Every store error ends the document with `Outcome::Failed` naming the
//! step. Nothing is retried.

use std::sync::Arc;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use similar::TextDiff;

use docsync_core::{Locale, LocaleTable, MissingContentStrategy, ReferenceId, SyncConfig, TagId};
use docsync_frontmatter::{parse_with, ParseOptions};
use docsync_store::{ContentStore, Entry, EntryPayload, Link, StoreError};

use crate::error::SyncError;
use crate::identity::{format_reference_id, source_tag, source_url};
use crate::outcome::{Outcome, Removal, Step};
use crate::validate::{validate, ValidationResult};

/// Fields rewritten for the document's locale on every update.
pub const LOCALE_FIELDS: [&str; 4] = ["title", "author", "markdown", "source"];

// ---------------------------------------------------------------------------
// Prepared documents
// ---------------------------------------------------------------------------

/// Where a document lives in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub reference_id: ReferenceId,
    pub locale: Locale,
}

/// A valid document, ready for store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyDocument {
    pub path: String,
    pub reference_id: ReferenceId,
    pub locale: Locale,
    pub slug: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    /// Deleted or unreadable. `removed` is the identity recovered from the
    /// previous revision, when the missing-content strategy asked for it.
    NoContent { removed: Option<Identity> },
    Invalid { missing: Vec<&'static str> },
    Ready(ReadyDocument),
}

impl Prepared {
    /// Entry this document will touch, if any.
    pub fn reference_id(&self) -> Option<&ReferenceId> {
        match self {
            Prepared::Ready(doc) => Some(&doc.reference_id),
            Prepared::NoContent {
                removed: Some(identity),
            } => Some(&identity.reference_id),
            _ => None,
        }
    }
}

/// Parse + validate + identity, without a store.
#[derive(Debug, Clone)]
pub struct Preparer {
    repository: String,
    locales: Arc<LocaleTable>,
    parse: ParseOptions,
    on_missing_content: MissingContentStrategy,
}

impl Preparer {
    pub fn new(
        repository: impl Into<String>,
        locales: Arc<LocaleTable>,
        parse: ParseOptions,
        on_missing_content: MissingContentStrategy,
    ) -> Self {
        Self {
            repository: repository.into(),
            locales,
            parse,
            on_missing_content,
        }
    }

    /// Whether [`Preparer::prepare`] uses previous-revision content.
    pub fn needs_previous(&self) -> bool {
        self.on_missing_content != MissingContentStrategy::Noop
    }

    pub fn prepare(&self, path: &str, content: Option<&str>, previous: Option<&str>) -> Prepared {
        let Some(content) = content else {
            let removed = if self.needs_previous() {
                previous.and_then(|text| self.identity(text))
            } else {
                None
            };
            return Prepared::NoContent { removed };
        };

        let parsed = parse_with(content, &self.parse);
        match validate(&parsed.front_matter, &self.locales) {
            ValidationResult::Invalid { missing } => Prepared::Invalid { missing },
            ValidationResult::Valid(valid) => Prepared::Ready(ReadyDocument {
                path: path.to_string(),
                reference_id: format_reference_id(&self.repository, &valid.slug),
                locale: valid.locale,
                slug: valid.slug,
                title: valid.title,
                body: parsed.body.unwrap_or_default(),
            }),
        }
    }

    fn identity(&self, text: &str) -> Option<Identity> {
        let parsed = parse_with(text, &self.parse);
        match validate(&parsed.front_matter, &self.locales) {
            ValidationResult::Valid(valid) => Some(Identity {
                reference_id: format_reference_id(&self.repository, &valid.slug),
                locale: valid.locale,
            }),
            ValidationResult::Invalid { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything `apply` needs besides the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub repository: String,
    pub author: String,
    pub branch: String,
    pub source_url_base: String,
    pub content_type: String,
    pub publish_on_create: bool,
    pub skip_unchanged: bool,
    pub dry_run: bool,
    pub on_missing_content: MissingContentStrategy,
    pub parse: ParseOptions,
}

impl ReconcileOptions {
    /// Options from a loaded config. `repository` and `author` are required.
    pub fn from_config(config: &SyncConfig, dry_run: bool) -> Result<Self, SyncError> {
        config.validate(false)?;
        Ok(Self {
            repository: config.repository.clone().unwrap_or_default(),
            author: config.author.clone().unwrap_or_default(),
            branch: config.branch.clone(),
            source_url_base: config.source_url_base.clone(),
            content_type: config.content_type.clone(),
            publish_on_create: config.publish_on_create,
            skip_unchanged: config.skip_unchanged,
            dry_run,
            on_missing_content: config.on_missing_content,
            parse: ParseOptions::from(&config.front_matter),
        })
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler {
    store: Arc<dyn ContentStore>,
    preparer: Preparer,
    options: ReconcileOptions,
    tag: TagId,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ContentStore>,
        locales: Arc<LocaleTable>,
        options: ReconcileOptions,
    ) -> Self {
        let preparer = Preparer::new(
            options.repository.clone(),
            locales,
            options.parse,
            options.on_missing_content,
        );
        let (tag, _) = source_tag(&options.repository);
        Self {
            store,
            preparer,
            options,
            tag,
        }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    pub fn preparer(&self) -> &Preparer {
        &self.preparer
    }

    pub fn prepare(&self, path: &str, content: Option<&str>, previous: Option<&str>) -> Prepared {
        self.preparer.prepare(path, content, previous)
    }

    /// `apply(prepare(..))`.
    pub fn reconcile(&self, path: &str, content: Option<&str>, previous: Option<&str>) -> Outcome {
        self.apply(path, self.prepare(path, content, previous))
    }

    /// Run the store calls for one prepared document.
    pub fn apply(&self, path: &str, prepared: Prepared) -> Outcome {
        match prepared {
            Prepared::Invalid { missing } => {
                tracing::warn!(
                    "{path}: missing required front matter: {}",
                    missing.join(", ")
                );
                Outcome::Invalid { missing }
            }
            Prepared::NoContent { removed: None } => {
                let reason = match self.options.on_missing_content {
                    MissingContentStrategy::Noop => "no content".to_string(),
                    strategy => format!(
                        "no content; previous revision has no usable identity to {strategy}"
                    ),
                };
                tracing::debug!("{path}: no action taken: {reason}");
                Outcome::no_action(reason)
            }
            Prepared::NoContent {
                removed: Some(identity),
            } => self.remove(path, &identity),
            Prepared::Ready(doc) => self.upsert(doc),
        }
    }

    // -----------------------------------------------------------------------
    // Create / update
    // -----------------------------------------------------------------------

    fn upsert(&self, doc: ReadyDocument) -> Outcome {
        match self.store.get_entry(&doc.reference_id) {
            Ok(entry) => self.update(doc, entry),
            Err(StoreError::NotFound(_)) => self.create(doc),
            Err(err) => {
                tracing::error!("{}: fetch {} failed: {err}", doc.path, doc.reference_id);
                Outcome::failed(Step::Fetch, err)
            }
        }
    }

    fn locale_values(&self, doc: &ReadyDocument) -> [(&'static str, Value); 4] {
        let url = source_url(
            &self.options.source_url_base,
            &self.options.repository,
            &self.options.branch,
            &doc.path,
        );
        [
            ("title", json!(doc.title)),
            ("author", json!([self.options.author])),
            ("markdown", json!(doc.body)),
            ("source", json!(url)),
        ]
    }

    fn create(&self, doc: ReadyDocument) -> Outcome {
        if self.options.dry_run {
            tracing::info!("[dry-run] would create {} for {}", doc.reference_id, doc.path);
            return Outcome::WouldCreate;
        }

        let locale = doc.locale.as_str();
        let mut payload = EntryPayload::default();
        for (field, value) in self.locale_values(&doc) {
            payload.fields.set(field, locale, value);
        }
        payload.fields.set("slug", locale, json!(doc.slug));
        payload.metadata.tags.push(Link::tag(self.tag.as_str()));

        let created = match self.store.create_entry_with_id(
            &self.options.content_type,
            &doc.reference_id,
            &payload,
        ) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::error!("{}: create {} failed: {err}", doc.path, doc.reference_id);
                return Outcome::failed(Step::Create, err);
            }
        };

        let published = self.options.publish_on_create
            && match self.store.publish_entry(&created) {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!(
                        "{}: created {} but publish failed: {err}",
                        doc.path,
                        doc.reference_id
                    );
                    false
                }
            };

        tracing::info!(
            "{}: created {} [{}] version {}",
            doc.path,
            doc.reference_id,
            doc.locale,
            created.version()
        );
        Outcome::Created {
            version: created.version(),
            published,
        }
    }

    fn update(&self, doc: ReadyDocument, mut entry: Entry) -> Outcome {
        let locale = doc.locale.as_str();
        let values = self.locale_values(&doc);

        if self.options.skip_unchanged
            && fingerprint_entry(&entry, locale) == fingerprint(&values)
        {
            tracing::debug!("{}: {} [{locale}] unchanged", doc.path, doc.reference_id);
            return Outcome::Unchanged;
        }

        if self.options.dry_run {
            let current = entry.fields.get_str("markdown", locale).unwrap_or_default();
            let diff = markdown_diff(&doc.path, current, &doc.body);
            tracing::info!("[dry-run] would update {} for {}", doc.reference_id, doc.path);
            return Outcome::WouldUpdate { diff };
        }

        for (field, value) in values {
            entry.fields.set(field, locale, value);
        }

        match self.store.update_entry(&entry) {
            Ok(updated) => {
                tracing::info!(
                    "{}: updated {} [{locale}] version {}",
                    doc.path,
                    doc.reference_id,
                    updated.version()
                );
                Outcome::Updated {
                    version: updated.version(),
                    updated_at: updated.sys.updated_at,
                    actor: updated.updated_by().map(str::to_string),
                }
            }
            Err(err) => {
                tracing::error!("{}: update {} failed: {err}", doc.path, doc.reference_id);
                Outcome::failed(Step::Update, err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Missing content
    // -----------------------------------------------------------------------

    fn remove(&self, path: &str, identity: &Identity) -> Outcome {
        let id = &identity.reference_id;
        let locale = identity.locale.as_str();

        let entry = match self.store.get_entry(id) {
            Ok(entry) => entry,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!("{path}: {id} not in store, nothing to remove");
                return Outcome::no_action(format!("no content; entry {id} not found"));
            }
            Err(err) => {
                tracing::error!("{path}: fetch {id} failed: {err}");
                return Outcome::failed(Step::Fetch, err);
            }
        };

        let mut trimmed = entry.clone();
        if !trimmed.fields.remove_locale(locale) {
            return Outcome::no_action(format!(
                "no content; entry {id} has no {locale} values"
            ));
        }

        if !trimmed.fields.locales("markdown").is_empty() {
            return self.remove_locale(path, identity, trimmed);
        }

        let removal = match self.options.on_missing_content {
            MissingContentStrategy::Delete => Removal::Deleted,
            _ => Removal::Archived,
        };
        if removal == Removal::Archived && entry.is_archived() {
            return Outcome::no_action(format!("no content; entry {id} already archived"));
        }
        if self.options.dry_run {
            tracing::info!("[dry-run] {path}: would remove {id}");
            return Outcome::WouldRemove { removal };
        }

        let entry = if entry.is_published() {
            match self.store.unpublish_entry(&entry) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::error!("{path}: unpublish {id} failed: {err}");
                    return Outcome::failed(Step::Unpublish, err);
                }
            }
        } else {
            entry
        };

        let result = match removal {
            Removal::Deleted => self.store.delete_entry(&entry).map_err(|e| (Step::Delete, e)),
            _ => self
                .store
                .archive_entry(&entry)
                .map(|_| ())
                .map_err(|e| (Step::Archive, e)),
        };
        match result {
            Ok(()) => {
                tracing::info!("{path}: {id} removed ({removal:?})");
                Outcome::Removed { removal }
            }
            Err((step, err)) => {
                tracing::error!("{path}: {step} {id} failed: {err}");
                Outcome::failed(step, err)
            }
        }
    }

    fn remove_locale(&self, path: &str, identity: &Identity, trimmed: Entry) -> Outcome {
        let removal = Removal::LocaleRemoved;
        if self.options.dry_run {
            tracing::info!(
                "[dry-run] {path}: would remove [{}] from {}",
                identity.locale,
                identity.reference_id
            );
            return Outcome::WouldRemove { removal };
        }
        match self.store.update_entry(&trimmed) {
            Ok(_) => {
                tracing::info!(
                    "{path}: removed [{}] from {}",
                    identity.locale,
                    identity.reference_id
                );
                Outcome::Removed { removal }
            }
            Err(err) => {
                tracing::error!("{path}: update {} failed: {err}", identity.reference_id);
                Outcome::failed(Step::Update, err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// SHA-256 over the locale fields, in [`LOCALE_FIELDS`] order.
fn fingerprint(values: &[(&'static str, Value)]) -> String {
    let mut hasher = Sha256::new();
    for (field, value) in values {
        hasher.update(field.as_bytes());
        hasher.update([0]);
        hasher.update(value.to_string().as_bytes());
        hasher.update([0]);
    }
    hex::encode(hasher.finalize())
}

fn fingerprint_entry(entry: &Entry, locale: &str) -> String {
    let values: Vec<(&'static str, Value)> = LOCALE_FIELDS
        .iter()
        .map(|field| {
            let value = entry.fields.get(field, locale).cloned().unwrap_or(Value::Null);
            (*field, value)
        })
        .collect();
    fingerprint(&values)
}

/// Unified diff of the markdown field, `a/` = store, `b/` = document.
pub fn markdown_diff(path: &str, current: &str, proposed: &str) -> String {
    let old_header = format!("a/{path}");
    let new_header = format!("b/{path}");
    TextDiff::from_lines(current, proposed)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preparer(strategy: MissingContentStrategy) -> Preparer {
        Preparer::new(
            "acme/handbook",
            Arc::new(LocaleTable::default()),
            ParseOptions::default(),
            strategy,
        )
    }

    const DOC: &str = "---\nslug: intro\nlang: ja\ntitle: はじめに\n---\n本文\n";

    #[test]
    fn prepare_ready_document() {
        let prepared =
            preparer(MissingContentStrategy::Noop).prepare("docs/intro.ja.md", Some(DOC), None);
        let Prepared::Ready(doc) = prepared else {
            panic!("expected ready, got {prepared:?}");
        };
        assert_eq!(doc.reference_id.as_str(), "acme_handbook_intro");
        assert_eq!(doc.locale.as_str(), "ja-JP");
        assert_eq!(doc.body, "本文\n");
    }

    #[test]
    fn noop_strategy_ignores_previous() {
        let prepared =
            preparer(MissingContentStrategy::Noop).prepare("docs/gone.md", None, Some(DOC));
        assert_eq!(prepared, Prepared::NoContent { removed: None });
        assert!(prepared.reference_id().is_none());
    }

    #[test]
    fn archive_strategy_recovers_identity() {
        let prepared =
            preparer(MissingContentStrategy::Archive).prepare("docs/gone.md", None, Some(DOC));
        assert_eq!(
            prepared.reference_id().map(ReferenceId::as_str),
            Some("acme_handbook_intro")
        );
    }

    #[test]
    fn fingerprint_tracks_values() {
        let a = [("title", json!("A")), ("author", json!(["x"]))];
        let b = [("title", json!("A")), ("author", json!(["y"]))];
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
    }

    #[test]
    fn diff_has_headers() {
        let diff = markdown_diff("docs/a.md", "old\n", "new\n");
        assert!(diff.contains("--- a/docs/a.md"), "got: {diff}");
        assert!(diff.contains("+++ b/docs/a.md"), "got: {diff}");
        assert!(diff.contains("-old"));
        assert!(diff.contains("+new"));
    }
}
