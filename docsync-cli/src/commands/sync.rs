//! `docsync sync`: reconcile documents with the store.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use docsync_sync::{pipeline, OutcomeLog, SyncOptions};

use super::context::{contentful_reconciler, outcome_marker, SourceArgs};

/// Arguments for `docsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Ignore changed paths and resync every document.
    #[arg(long, conflicts_with = "paths")]
    pub all: bool,

    /// Report what would change without writing to the store.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Revision the change set is based on, used to recover removed
    /// documents.
    #[arg(long)]
    pub base_rev: Option<String>,
}

impl SyncArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.source.load_config()?;
        let reconciler = contentful_reconciler(&config, self.dry_run)?;
        let source = self
            .source
            .document_source(true)
            .with_base_revision(self.base_rev.clone());
        let options = SyncOptions::from_config(&config, self.all);

        let log = pipeline::run(&source, reconciler, &options).context("sync failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&log).context("failed to serialize outcome JSON")?
            );
        } else {
            print_log(&log, self.dry_run);
        }

        Ok(if log.has_errors() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

fn print_log(log: &OutcomeLog, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if log.is_empty() {
        println!("{prefix}No documents to sync.");
        return;
    }

    for (path, outcome) in log.iter() {
        println!("{}  {path}: {outcome}", outcome_marker(outcome));
    }

    let summary = log.summary();
    println!(
        "{prefix}{} documents: {} changed, {} unchanged, {} skipped, {} invalid, {} failed",
        log.len(),
        summary.changed,
        summary.unchanged,
        summary.skipped,
        summary.invalid,
        summary.failed
    );
}
