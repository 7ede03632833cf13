//! docsync: keep versioned markdown docs in sync with a headless CMS.
//!
//! # Usage
//!
//! ```text
//! docsync sync [PATHS...] [--all] [--dry-run] [--json] [--config FILE] [--root DIR] [--base-rev REV]
//! docsync check [PATHS...] [--json] [--config FILE] [--root DIR]
//! docsync diff [PATHS...] [--config FILE] [--root DIR]
//! ```
//!
//! Settings come from `docsync.yaml` under `--root`, overlaid with the
//! environment (a `.env` file is loaded first when present).

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, diff::DiffArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "docsync",
    version,
    about = "Reconcile markdown documents with a headless CMS",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update one CMS entry per document.
    Sync(SyncArgs),

    /// Parse and validate documents without contacting the store.
    Check(CheckArgs),

    /// Show markdown diffs for entries a sync would update.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
