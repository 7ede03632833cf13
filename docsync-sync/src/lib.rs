//! # docsync-sync
//!
//! Reconciliation of markdown documents against a content store.
//!
//! [`Reconciler`] handles one document at a time; [`pipeline::run`] drives a
//! whole batch from a [`DocumentSource`], grouping documents that target the
//! same entry so their writes never race.

pub mod error;
pub mod identity;
pub mod outcome;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod tags;
pub mod validate;

pub use error::SyncError;
pub use identity::{format_reference_id, resolve_locale, source_tag, source_url};
pub use outcome::{Outcome, OutcomeLog, OutcomeSummary, Removal, Step};
pub use pipeline::{run, run_async, select_paths, SyncOptions};
pub use reconcile::{
    markdown_diff, Identity, Prepared, Preparer, ReadyDocument, ReconcileOptions, Reconciler,
};
pub use source::{parse_changed_files, DocumentSource, FsDocumentSource, MemorySource};
pub use tags::{ensure_source_tag, TagStatus};
pub use validate::{validate, ValidDocument, ValidationResult, REQUIRED_KEYS};
