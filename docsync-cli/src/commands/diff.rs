//! `docsync diff`: unified diffs for entries a sync would update.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use docsync_sync::{pipeline, Outcome, SyncOptions};

use super::context::{contentful_reconciler, outcome_marker, SourceArgs};

/// Arguments for `docsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.source.load_config()?;
        let reconciler = contentful_reconciler(&config, true)?;
        let source = self.source.document_source(true);
        let options = SyncOptions::from_config(&config, false);

        let log = pipeline::run(&source, reconciler, &options).context("diff failed")?;

        let mut differences = 0;
        for (path, outcome) in log.iter() {
            match outcome {
                Outcome::WouldUpdate { diff } if !diff.is_empty() => {
                    differences += 1;
                    print!("{diff}");
                    if !diff.ends_with('\n') {
                        println!();
                    }
                }
                Outcome::WouldUpdate { .. } | Outcome::Unchanged | Outcome::NoAction { .. } => {}
                other => {
                    differences += 1;
                    println!("{}  {path}: {other}", outcome_marker(other));
                }
            }
        }
        if differences == 0 {
            println!("No differences.");
        }

        Ok(if log.has_errors() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}
