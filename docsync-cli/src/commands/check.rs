//! `docsync check`: offline front-matter validation.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use docsync_core::MissingContentStrategy;
use docsync_frontmatter::ParseOptions;
use docsync_sync::{select_paths, DocumentSource, Prepared, Preparer, SyncOptions};

use super::context::SourceArgs;

/// Arguments for `docsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct CheckRow {
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "slug")]
    slug: String,
    #[tabled(rename = "locale")]
    locale: String,
    #[tabled(rename = "reference id")]
    reference_id: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(skip)]
    #[serde(skip)]
    valid: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<ExitCode> {
        let config = self.source.load_config()?;
        let repository = config
            .repository
            .clone()
            .filter(|r| !r.trim().is_empty())
            .context("repository is not configured; set REPOSITORY or `repository:` in docsync.yaml")?;
        let preparer = Preparer::new(
            repository,
            Arc::new(config.locales.clone()),
            ParseOptions::from(&config.front_matter),
            MissingContentStrategy::Noop,
        );

        let source = self.source.document_source(false);
        let options = SyncOptions::from_config(&config, false);
        let paths = select_paths(&source, &options).context("failed to list documents")?;

        let rows: Vec<CheckRow> = paths
            .into_iter()
            .map(|path| {
                let document = source.load(&path);
                let prepared = preparer.prepare(&document.path, document.content.as_deref(), None);
                row(document.path, prepared)
            })
            .collect();
        let invalid = rows.iter().filter(|row| !row.valid).count();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize check JSON")?
            );
        } else {
            print_table(rows, invalid);
        }

        Ok(if invalid > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

fn row(path: String, prepared: Prepared) -> CheckRow {
    match prepared {
        Prepared::Ready(doc) => CheckRow {
            path,
            slug: doc.slug,
            locale: doc.locale.to_string(),
            reference_id: doc.reference_id.to_string(),
            status: "ok".to_string(),
            valid: true,
        },
        Prepared::Invalid { missing } => CheckRow {
            path,
            slug: String::new(),
            locale: String::new(),
            reference_id: String::new(),
            status: format!("missing: {}", missing.join(", ")),
            valid: false,
        },
        Prepared::NoContent { .. } => CheckRow {
            path,
            slug: String::new(),
            locale: String::new(),
            reference_id: String::new(),
            status: "no content".to_string(),
            valid: true,
        },
    }
}

fn print_table(rows: Vec<CheckRow>, invalid: usize) {
    if rows.is_empty() {
        println!("No documents found.");
        return;
    }

    let total = rows.len();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if invalid > 0 {
        println!(
            "{} {invalid} of {total} documents have invalid front matter",
            "!".magenta().bold()
        );
    } else {
        println!("{} {total} documents ok", "■".green().bold());
    }
}
