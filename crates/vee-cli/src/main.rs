//! `vee` — license tracker import and renewal evaluation.
//!
//! # Usage
//!
//! ```
//! vee init
//! vee import-tracker exports/tracker.xlsx --skip-rows 4
//! vee evaluate-licenses
//! vee list --status expired
//! ```
//!
//! Settings come from `vee.toml` (or `--config`) and `VEE_*` environment
//! variables. Summaries are printed to stdout as JSON; logs go to stderr.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use settings::Settings;
use tracing_subscriber::EnvFilter;
use vee_core::{
  clock::{Clock, FixedClock, SystemClock},
  store::TrackerStore,
};
use vee_store_sqlite::SqliteStore;
use vee_tracker::{RenewalEvaluator, SourceOptions, TrackerImporter};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vee", author, version, about = "License tracker import and renewal evaluation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "vee.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create data directories and the database schema.
  Init,

  /// Import a tracker spreadsheet (default: <tracker_dir>/tracker.xlsx).
  ImportTracker {
    path: Option<PathBuf>,

    /// Rows above the header row; overrides `header_skip_rows`.
    #[arg(long)]
    skip_rows: Option<usize>,

    /// Worksheet name; overrides `sheet`.
    #[arg(long)]
    sheet: Option<String>,
  },

  /// Recompute the renewal status of every record.
  EvaluateLicenses {
    /// Evaluate as of this date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    today: Option<NaiveDate>,
  },

  /// Print stored records as JSON.
  List {
    /// Only records whose stored status equals this value.
    #[arg(long)]
    status: Option<String>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
    )
    .with_writer(std::io::stderr)
    .init();

  settings.ensure_directories()?;

  let store = SqliteStore::open(&settings.db_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.db_path))?;
  let store = Arc::new(store);
  tracing::debug!(db = %settings.db_path.display(), "store opened");

  match cli.command {
    Command::Init => {
      println!("VEE initialized at {}", settings.db_path.display());
    }

    Command::ImportTracker { path, skip_rows, sheet } => {
      let path = path.unwrap_or_else(|| settings.default_tracker_file());
      let options = SourceOptions {
        skip_rows: skip_rows.unwrap_or(settings.header_skip_rows),
        sheet:     sheet.or_else(|| settings.sheet.clone()),
      };
      let summary = TrackerImporter::new(store, SystemClock)
        .import_file(&path, &options)
        .await
        .with_context(|| format!("failed to import {}", path.display()))?;
      print_json(&summary)?;
    }

    Command::EvaluateLicenses { today } => {
      let clock: Arc<dyn Clock> = match today {
        Some(day) => Arc::new(FixedClock::new(Utc::now(), day)),
        None => Arc::new(SystemClock),
      };
      let census = RenewalEvaluator::new(store, clock)
        .evaluate()
        .await
        .context("license evaluation failed")?;
      print_json(&census)?;
    }

    Command::List { status } => {
      let records = store
        .list_records(status)
        .await
        .context("failed to list records")?;
      print_json(&records)?;
    }
  }

  Ok(())
}

/// Pretty JSON with object keys sorted.
fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let value = serde_json::to_value(value)?;
  println!("{}", serde_json::to_string_pretty(&value)?);
  Ok(())
}
