//! `gambit`: monthly chess-history ETL.
//!
//! # Usage
//!
//! ```text
//! gambit run 2024-01
//! gambit backfill --from 2023-06 --to 2024-01
//! gambit --username hikaru --data-root ./lake backfill
//! gambit load-warehouse
//! ```
//!
//! Settings come from `gambit.toml` (optional), then `GAMBIT_*` environment
//! variables, then command-line flags; later sources win.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use gambit_core::Batch;
use gambit_pipeline::{ChessComClient, Pipeline, PipelineConfig, RunReport};
use gambit_store_lake::LakeStore;
use gambit_store_sqlite::SqliteWarehouse;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

type GambitPipeline = Pipeline<ChessComClient, LakeStore, SqliteWarehouse>;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gambit", version, about = "Monthly chess-history ETL")]
struct Args {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "gambit.toml")]
  config: PathBuf,

  /// Account whose games are processed.
  #[arg(long)]
  username: Option<String>,

  /// Root directory of the data lake.
  #[arg(long, value_name = "DIR")]
  data_root: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run one month end to end.
  Run {
    /// The month to process, as YYYY-MM.
    batch: Batch,
  },
  /// Run a range of months in order, stopping at the first failure.
  Backfill {
    /// First month (default: the oldest archive on the server).
    #[arg(long)]
    from: Option<Batch>,
    /// Last month (default: the current month).
    #[arg(long)]
    to:   Option<Batch>,
  },
  /// Load the current gold snapshots into the warehouse.
  LoadWarehouse,
}

// ─── Configuration ───────────────────────────────────────────────────────────

fn load_config(args: &Args) -> Result<PipelineConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(args.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("GAMBIT"))
    .set_override_option("username", args.username.clone())?
    .set_override_option(
      "data_root",
      args
        .data_root
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned()),
    )?
    .build()
    .context("failed to read configuration")?;

  settings
    .try_deserialize()
    .context("failed to deserialise PipelineConfig (username and data_root are required)")
}

fn current_month() -> Result<Batch> {
  let today = Utc::now().date_naive();
  Ok(Batch::new(today.year(), today.month())?)
}

// ─── Commands ────────────────────────────────────────────────────────────────

fn print_report(report: &RunReport) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(report)?);
  Ok(())
}

async fn backfill(
  pipeline: &GambitPipeline,
  from: Option<Batch>,
  to: Option<Batch>,
) -> Result<()> {
  let last = match to {
    Some(b) => b,
    None => current_month()?,
  };
  let batches: Vec<Batch> = match from {
    Some(first) => first.through(last).collect(),
    None => pipeline
      .archives()
      .await
      .context("listing archives")?
      .into_iter()
      .filter(|b| *b <= last)
      .collect(),
  };
  if batches.is_empty() {
    tracing::warn!("nothing to backfill");
    return Ok(());
  }

  tracing::info!(
    first = %batches[0],
    last = %batches[batches.len() - 1],
    count = batches.len(),
    "starting backfill"
  );
  for report in pipeline.backfill(batches).await? {
    print_report(&report)?;
  }
  Ok(())
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let config = load_config(&args)?;

  let source = ChessComClient::new(&config).context("failed to build HTTP client")?;
  let lake = LakeStore::new(&config.data_root);
  let warehouse = match &config.warehouse_path {
    Some(path) => Some(
      SqliteWarehouse::open(path)
        .await
        .with_context(|| format!("failed to open warehouse at {path:?}"))?,
    ),
    None => None,
  };

  let mut pipeline: GambitPipeline = Pipeline::new(config, source, lake);
  if let Some(w) = warehouse {
    pipeline = pipeline.with_warehouse(w);
  }

  match args.command {
    Command::Run { batch } => {
      let report = pipeline.run_batch(batch).await?;
      print_report(&report)?;
    }
    Command::Backfill { from, to } => backfill(&pipeline, from, to).await?,
    Command::LoadWarehouse => {
      if pipeline.warehouse().is_none() {
        bail!("warehouse_path is not configured");
      }
      for (table, rows) in pipeline.publish().await.context("loading warehouse")? {
        println!("{table}\t{rows}");
      }
    }
  }

  Ok(())
}
