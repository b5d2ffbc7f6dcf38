//! `roster` — administrative commands for the directory mirror.
//!
//! # Usage
//!
//! ```text
//! roster sync
//! roster --config /etc/roster/roster.toml list --type student
//! roster runs --limit 5
//! ```

mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use roster_core::{person::PersonType, store::DirectoryStore};
use roster_store_sqlite::SqliteStore;
use roster_sync::{HttpDirectorySource, Reconciler, Reporter};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Mirror the external person directory into a local store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "roster.toml", env = "ROSTER_CONFIG")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Fetch the remote directory and upsert every valid record.
  Sync,

  /// Print stored directory people.
  List {
    /// Only people of this type (student or employee).
    #[arg(long = "type", value_name = "TYPE")]
    person_type: Option<PersonType>,
  },

  /// Print recent sync runs, newest first.
  Runs {
    #[arg(long, default_value_t = 20)]
    limit: usize,
  },
}

// ─── Progress output ──────────────────────────────────────────────────────────

/// Prints progress lines for the operator running the command.
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
  fn progress(&self, message: &str) { println!("{message}"); }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store_path = settings.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Sync => sync(&settings, store).await,
    Command::List { person_type } => list(&store, person_type).await,
    Command::Runs { limit } => runs(&store, limit).await,
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn sync(settings: &Settings, store: SqliteStore) -> Result<()> {
  let source = HttpDirectorySource::new(settings.source_config()?)
    .context("failed to build directory API client")?;

  Reconciler::new(store, source)
    .with_reporter(Arc::new(ConsoleReporter))
    .reconcile()
    .await
    .context("directory sync failed")?;
  Ok(())
}

async fn list(store: &SqliteStore, person_type: Option<PersonType>) -> Result<()> {
  let people = store
    .list_people(person_type)
    .await
    .context("failed to list directory people")?;

  for p in &people {
    println!(
      "{}\t{}\t{}\t{}\t{}\t{}",
      p.external_ref_id,
      p.person_type,
      p.display_name(),
      p.email.as_deref().unwrap_or("-"),
      p.department_or_course.as_deref().unwrap_or("-"),
      p.last_synced_at.format("%Y-%m-%d %H:%M:%S"),
    );
  }
  println!("{} people", people.len());
  Ok(())
}

async fn runs(store: &SqliteStore, limit: usize) -> Result<()> {
  let runs = store.list_runs(limit).await.context("failed to list sync runs")?;

  for run in &runs {
    println!(
      "{}\t{}\t{}{}",
      run.started_at.format("%Y-%m-%d %H:%M:%S"),
      run.status.as_str(),
      run.summary,
      run
        .error_message
        .as_deref()
        .map(|e| format!("\terror: {e}"))
        .unwrap_or_default(),
    );
  }
  Ok(())
}
