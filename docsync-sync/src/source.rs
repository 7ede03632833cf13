//! Document sources: where paths and content come from.
//!
//! Paths are always `/`-separated and relative to the source root, the form
//! used in `FILES_CHANGED` and in source URLs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use docsync_core::Document;

use crate::error::{io_err, SyncError};

/// Paths and content for one run.
pub trait DocumentSource: Send + Sync {
    /// Paths changed by the triggering event. Empty means "unknown".
    fn changed_paths(&self) -> Vec<String>;

    /// Every path known to the source, for a full resync.
    fn all_paths(&self) -> Result<Vec<String>, SyncError>;

    /// Current content; `None` when deleted or unreadable.
    fn read(&self, path: &str) -> Option<String>;

    /// Content at the base revision, when one is known.
    fn previous(&self, path: &str) -> Option<String>;

    /// Read `path` once into a [`Document`].
    fn load(&self, path: &str) -> Document {
        Document::new(path, self.read(path))
    }
}

/// Split a `FILES_CHANGED` value into paths.
///
/// One pair of surrounding double quotes is stripped, then the value is
/// split on whitespace.
pub fn parse_changed_files(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.split_whitespace().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

/// Working tree on disk, with `git show` for previous revisions.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    root: PathBuf,
    changed: Vec<String>,
    base_revision: Option<String>,
}

impl FsDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            changed: Vec::new(),
            base_revision: None,
        }
    }

    pub fn with_changed(mut self, changed: Vec<String>) -> Self {
        self.changed = changed;
        self
    }

    pub fn with_base_revision(mut self, revision: Option<String>) -> Self {
        self.base_revision = revision.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentSource for FsDocumentSource {
    fn changed_paths(&self) -> Vec<String> {
        self.changed.clone()
    }

    fn all_paths(&self) -> Result<Vec<String>, SyncError> {
        let mut paths = Vec::new();
        walk(&self.root, &self.root, &mut paths)?;
        paths.sort();
        Ok(paths)
    }

    fn read(&self, path: &str) -> Option<String> {
        let full = self.root.join(path);
        match std::fs::read_to_string(&full) {
            Ok(content) => Some(content),
            Err(err) => {
                tracing::debug!("cannot read {}: {err}", full.display());
                None
            }
        }
    }

    fn previous(&self, path: &str) -> Option<String> {
        let revision = self.base_revision.as_deref()?;
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .arg("show")
            .arg(format!("{revision}:{path}"))
            .output();
        match output {
            Ok(output) if output.status.success() => String::from_utf8(output.stdout).ok(),
            Ok(output) => {
                tracing::debug!(
                    "git show {revision}:{path} failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(err) => {
                tracing::warn!("cannot run git: {err}");
                None
            }
        }
    }
}

/// Collect files under `dir`, skipping hidden entries.
fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            walk(root, &path, out)?;
        } else if file_type.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Fixed set of documents, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
    previous: BTreeMap<String, String>,
    changed: Vec<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_previous(mut self, path: &str, content: &str) -> Self {
        self.previous.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_changed(mut self, paths: &[&str]) -> Self {
        self.changed = paths.iter().map(|p| (*p).to_string()).collect();
        self
    }
}

impl DocumentSource for MemorySource {
    fn changed_paths(&self) -> Vec<String> {
        self.changed.clone()
    }

    fn all_paths(&self) -> Result<Vec<String>, SyncError> {
        Ok(self.files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn previous(&self, path: &str) -> Option<String> {
        self.previous.get(path).cloned()
    }
}
