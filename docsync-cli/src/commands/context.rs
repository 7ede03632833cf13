//! Shared command plumbing: source arguments, config loading, store setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use docsync_core::{config, SyncConfig};
use docsync_store::{ContentStore, ContentfulStore};
use docsync_sync::{parse_changed_files, FsDocumentSource, Outcome, ReconcileOptions, Reconciler};

/// Env var holding the paths changed by the triggering event.
const FILES_CHANGED: &str = "FILES_CHANGED";

/// Arguments shared by every command.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Paths to process, relative to `--root`.
    pub paths: Vec<String>,

    /// Repository checkout containing the documents.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Config file (default: `<root>/docsync.yaml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    /// Load `.env`, the config file, and the environment overlay.
    pub fn load_config(&self) -> Result<SyncConfig> {
        load_dotenv(&self.root);
        let path = self
            .config
            .clone()
            .unwrap_or_else(|| self.root.join(config::DEFAULT_CONFIG_FILE));
        let mut config = config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        config
            .apply_env()
            .context("invalid configuration in environment")?;
        Ok(config)
    }

    /// Source over `--root`; explicit paths, else `FILES_CHANGED` when
    /// `use_env` is set.
    pub fn document_source(&self, use_env: bool) -> FsDocumentSource {
        let changed = if !self.paths.is_empty() || !use_env {
            self.paths.clone()
        } else {
            std::env::var(FILES_CHANGED)
                .map(|raw| parse_changed_files(&raw))
                .unwrap_or_default()
        };
        FsDocumentSource::new(&self.root).with_changed(changed)
    }
}

fn load_dotenv(root: &Path) {
    dotenvy::dotenv().ok();
    let project_env = root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path(&project_env);
    }
}

/// Reconciler backed by the Contentful client.
pub fn contentful_reconciler(config: &SyncConfig, dry_run: bool) -> Result<Arc<Reconciler>> {
    config
        .validate(true)
        .context("incomplete configuration")?;
    let options = ReconcileOptions::from_config(config, dry_run)?;
    let store: Arc<dyn ContentStore> = Arc::new(
        ContentfulStore::from_config(&config.store).context("failed to build store client")?,
    );
    tracing::debug!("using {} store", store.name());
    Ok(Arc::new(Reconciler::new(
        store,
        Arc::new(config.locales.clone()),
        options,
    )))
}

/// Colored marker for one outcome line.
pub fn outcome_marker(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created { .. } | Outcome::Updated { .. } | Outcome::Removed { .. } => {
            "✎".green().bold().to_string()
        }
        Outcome::WouldCreate | Outcome::WouldUpdate { .. } | Outcome::WouldRemove { .. } => {
            "~".yellow().bold().to_string()
        }
        Outcome::Unchanged | Outcome::NoAction { .. } => "·".bright_black().to_string(),
        Outcome::Invalid { .. } => "!".magenta().bold().to_string(),
        Outcome::Failed { .. } => "✗".red().bold().to_string(),
    }
}
