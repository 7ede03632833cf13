//! Shared sync pipeline entrypoint used by the `sync` and `diff` commands.
//!
//! 1. Select paths: changed paths, else every path; keep markdown files
//!    under `docs_dir`.
//! 2. Ensure the source tag exists (fatal on failure).
//! 3. Read and prepare every document.
//! 4. Group by reference id. A removal whose locale is still provided by a
//!    live document in the same group (a rename) is resolved as no action.
//! 5. Groups run concurrently on blocking tasks, documents inside a group
//!    run in path order.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

use docsync_core::{Locale, ReferenceId, SyncConfig};

use crate::error::{io_err, SyncError};
use crate::outcome::{Outcome, OutcomeLog, Step};
use crate::reconcile::{Prepared, Reconciler};
use crate::source::DocumentSource;
use crate::tags::ensure_source_tag;

const MARKDOWN_EXTENSIONS: [&str; 2] = [".md", ".markdown"];

/// Batch-level knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Only paths under this directory are synced.
    pub docs_dir: String,
    /// Maximum number of entries reconciled at once.
    pub concurrency: usize,
    /// Ignore changed paths and resync everything.
    pub full: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            docs_dir: "docs".to_string(),
            concurrency: 4,
            full: false,
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig, full: bool) -> Self {
        Self {
            docs_dir: config.docs_dir.clone(),
            concurrency: config.concurrency,
            full,
        }
    }
}

/// Paths this run will process, deduplicated and sorted.
pub fn select_paths(
    source: &dyn DocumentSource,
    options: &SyncOptions,
) -> Result<Vec<String>, SyncError> {
    let changed = if options.full {
        Vec::new()
    } else {
        source.changed_paths()
    };
    let candidates = if changed.is_empty() {
        tracing::info!("no changed paths given, running a full resync");
        source.all_paths()?
    } else {
        changed
    };

    let docs_dir = options.docs_dir.trim_matches('/');
    let selected: BTreeSet<String> = candidates
        .into_iter()
        .map(|path| path.trim_start_matches("./").to_string())
        .filter(|path| in_docs_dir(path, docs_dir) && is_markdown(path))
        .collect();
    Ok(selected.into_iter().collect())
}

fn in_docs_dir(path: &str, docs_dir: &str) -> bool {
    docs_dir.is_empty()
        || path
            .strip_prefix(docs_dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_markdown(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    MARKDOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Run one batch on a fresh multi-threaded runtime.
pub fn run(
    source: &dyn DocumentSource,
    reconciler: Arc<Reconciler>,
    options: &SyncOptions,
) -> Result<OutcomeLog, SyncError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run_async(source, reconciler, options))
}

/// Run one batch on the caller's runtime.
pub async fn run_async(
    source: &dyn DocumentSource,
    reconciler: Arc<Reconciler>,
    options: &SyncOptions,
) -> Result<OutcomeLog, SyncError> {
    let paths = select_paths(source, options)?;

    let tag_reconciler = reconciler.clone();
    let status = tokio::task::spawn_blocking(move || {
        let options = tag_reconciler.options();
        ensure_source_tag(tag_reconciler.store(), &options.repository, options.dry_run)
    })
    .await
    .map_err(|e| SyncError::Task(format!("tag bookkeeping join error: {e}")))??;
    tracing::debug!("source tag: {status:?}");

    let mut log = OutcomeLog::new();
    let mut groups: BTreeMap<ReferenceId, Vec<(String, Prepared)>> = BTreeMap::new();
    for path in paths {
        let document = source.load(&path);
        let previous = if document.content.is_none() && reconciler.preparer().needs_previous() {
            source.previous(&document.path)
        } else {
            None
        };
        let prepared = reconciler.prepare(
            &document.path,
            document.content.as_deref(),
            previous.as_deref(),
        );
        match prepared.reference_id().cloned() {
            Some(id) => groups.entry(id).or_default().push((document.path, prepared)),
            None => {
                let outcome = reconciler.apply(&document.path, prepared);
                log.insert(document.path, outcome);
            }
        }
    }

    let groups = groups
        .into_iter()
        .map(|(id, documents)| (id, supersede_removals(documents, &mut log)))
        .collect();
    log.extend(apply_groups(reconciler, groups, options.concurrency).await?);

    let summary = log.summary();
    tracing::info!(
        "processed {} document(s): {} changed, {} unchanged, {} skipped, {} invalid, {} failed",
        log.len(),
        summary.changed,
        summary.unchanged,
        summary.skipped,
        summary.invalid,
        summary.failed
    );
    Ok(log)
}

/// Drop removals for locales a live document in the group still provides.
///
/// A `git mv` that keeps the slug shows up as one deleted and one live path
/// for the same entry and locale; removing would undo the live update.
fn supersede_removals(
    documents: Vec<(String, Prepared)>,
    log: &mut OutcomeLog,
) -> Vec<(String, Prepared)> {
    let live: Vec<(Locale, String)> = documents
        .iter()
        .filter_map(|(path, prepared)| match prepared {
            Prepared::Ready(doc) => Some((doc.locale.clone(), path.clone())),
            _ => None,
        })
        .collect();

    documents
        .into_iter()
        .filter_map(|(path, prepared)| {
            if let Prepared::NoContent {
                removed: Some(identity),
            } = &prepared
            {
                if let Some((_, live_path)) =
                    live.iter().find(|(locale, _)| *locale == identity.locale)
                {
                    tracing::info!("{path}: removal superseded by {live_path}");
                    let reason = format!("no content; superseded by {live_path}");
                    log.insert(path, Outcome::no_action(reason));
                    return None;
                }
            }
            Some((path, prepared))
        })
        .collect()
}

async fn apply_groups(
    reconciler: Arc<Reconciler>,
    groups: BTreeMap<ReferenceId, Vec<(String, Prepared)>>,
    concurrency: usize,
) -> Result<Vec<(String, Outcome)>, SyncError> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut pending: HashMap<Id, Vec<String>> = HashMap::new();

    for (id, documents) in groups {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?;
        let paths: Vec<String> = documents.iter().map(|(path, _)| path.clone()).collect();
        let reconciler = reconciler.clone();
        let handle = tasks.spawn_blocking(move || {
            let _permit = permit;
            tracing::debug!("reconciling {} document(s) for {id}", documents.len());
            documents
                .into_iter()
                .map(|(path, prepared)| {
                    let outcome = reconciler.apply(&path, prepared);
                    (path, outcome)
                })
                .collect::<Vec<_>>()
        });
        pending.insert(handle.id(), paths);
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((task, group)) => {
                pending.remove(&task);
                outcomes.extend(group);
            }
            Err(err) => {
                let paths = pending.remove(&err.id()).unwrap_or_default();
                tracing::error!(
                    "reconciliation task for {} document(s) failed: {err}",
                    paths.len()
                );
                outcomes.extend(
                    paths
                        .into_iter()
                        .map(|path| (path, Outcome::failed(Step::Task, &err))),
                );
            }
        }
    }
    Ok(outcomes)
}
