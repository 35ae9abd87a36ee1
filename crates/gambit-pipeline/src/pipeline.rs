//! [`Pipeline`]: one batch run from fetch to publish.

use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use gambit_core::{
  Batch,
  batch::{DIM_DATE, DIM_OPENINGS, DIM_RESULTS, DIM_TIME_CONTROL, FACT_GAMES},
  dimension::{DateDim, Dimension, OpeningDim, ResultDim, TimeControlDim, merge_dimension},
  fact::{DimensionSet, FACT_TABLE, FactRow, build_fact_rows, ensure_unique_urls, merge_facts},
  game::{ParsedGame, RawGame},
  store::{BlobStore, GameSource, SnapshotStore, Warehouse},
  table::{Table, Tabular},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  PipelineConfig,
  error::{Error, FetchError, Result, RunError},
  step::Step,
  transform,
};

/// Gold snapshots and the warehouse tables they are published to, in load
/// order.
const GOLD_TABLES: [(&str, &str); 5] = [
  (DIM_DATE, DateDim::TABLE),
  (DIM_OPENINGS, OpeningDim::TABLE),
  (DIM_TIME_CONTROL, TimeControlDim::TABLE),
  (DIM_RESULTS, ResultDim::TABLE),
  (FACT_GAMES, FACT_TABLE),
];

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Summary of one successful batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub run_id:        Uuid,
  pub batch:         Batch,
  pub games_fetched: usize,
  pub games_parsed:  usize,
  /// Games without a usable notation blob.
  pub games_skipped: usize,
  /// Rows in the cumulative fact snapshot after this run.
  pub fact_rows:     usize,
  /// Rows loaded per warehouse table; empty when no warehouse is configured.
  pub published:     Vec<(String, usize)>,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// The batch ETL over a game source, a data lake, and an optional
/// warehouse.
///
/// Runs are strictly sequential. Two pipelines must not write the same lake
/// or warehouse concurrently.
pub struct Pipeline<S, L, W> {
  config:    PipelineConfig,
  source:    S,
  lake:      L,
  warehouse: Option<W>,
}

impl<S, L, W> Pipeline<S, L, W>
where
  S: GameSource,
  L: BlobStore + SnapshotStore,
  W: Warehouse,
{
  pub fn new(config: PipelineConfig, source: S, lake: L) -> Self {
    Self {
      config,
      source,
      lake,
      warehouse: None,
    }
  }

  pub fn with_warehouse(mut self, warehouse: W) -> Self {
    self.warehouse = Some(warehouse);
    self
  }

  pub fn config(&self) -> &PipelineConfig { &self.config }

  pub fn source(&self) -> &S { &self.source }

  pub fn lake(&self) -> &L { &self.lake }

  pub fn warehouse(&self) -> Option<&W> { self.warehouse.as_ref() }

  /// Every batch the source holds for the configured user, oldest first.
  pub async fn archives(&self) -> Result<Vec<Batch>> {
    self
      .source
      .archives(&self.config.username)
      .await
      .map_err(Error::fetch)
  }

  /// Run `batch`, stamping every derived row with the current UTC time.
  pub async fn run_batch(&self, batch: Batch) -> Result<RunReport, RunError> {
    self.run_batch_at(batch, Utc::now().naive_utc()).await
  }

  /// Run `batch` end to end with an explicit `last_updated` stamp.
  #[tracing::instrument(skip_all, fields(batch = %batch, run_id = tracing::field::Empty))]
  pub async fn run_batch_at(
    &self,
    batch: Batch,
    last_updated: NaiveDateTime,
  ) -> Result<RunReport, RunError> {
    let run_id = Uuid::new_v4();
    tracing::Span::current().record("run_id", tracing::field::display(run_id));
    let tag = |step: Step| move |source: Error| RunError { batch, step, source };

    let games_fetched = self.fetch(batch).await.map_err(tag(Step::Fetch))?;
    let (parsed, games_skipped) = self
      .parse(batch, last_updated)
      .await
      .map_err(tag(Step::Parse))?;

    let dims = DimensionSet {
      dates:         self
        .update_dimension(transform::date_candidates(&parsed))
        .await
        .map_err(tag(Step::DimDate))?,
      openings:      self
        .update_dimension(transform::opening_candidates(&parsed))
        .await
        .map_err(tag(Step::DimOpenings))?,
      time_controls: self
        .update_dimension(transform::time_control_candidates(&parsed))
        .await
        .map_err(tag(Step::DimTimeControl))?,
      results:       self
        .update_dimension(transform::result_candidates(&parsed))
        .await
        .map_err(tag(Step::DimResults))?,
    };

    let fact_rows = self
      .update_facts(&parsed, &dims)
      .await
      .map_err(tag(Step::Fact))?;

    let published = if self.warehouse.is_some() {
      self.publish().await.map_err(tag(Step::Publish))?
    } else {
      info!("no warehouse configured; skipping publish");
      Vec::new()
    };

    info!(
      games_fetched,
      games_parsed = parsed.len(),
      games_skipped,
      fact_rows,
      "batch complete"
    );
    Ok(RunReport {
      run_id,
      batch,
      games_fetched,
      games_parsed: parsed.len(),
      games_skipped,
      fact_rows,
      published,
    })
  }

  /// Run each batch in order, stopping at the first failure.
  pub async fn backfill(
    &self,
    batches: impl IntoIterator<Item = Batch>,
  ) -> Result<Vec<RunReport>, RunError> {
    let mut reports = Vec::new();
    for batch in batches {
      reports.push(self.run_batch(batch).await?);
    }
    Ok(reports)
  }

  /// Replace every warehouse table with its current gold snapshot. Snapshots
  /// that do not exist yet are skipped.
  pub async fn publish(&self) -> Result<Vec<(String, usize)>> {
    let warehouse = self.warehouse.as_ref().ok_or(Error::NoWarehouse)?;

    let mut loaded = Vec::with_capacity(GOLD_TABLES.len());
    for (snapshot, table) in GOLD_TABLES {
      let Some(data) = self.lake.read_table(snapshot).await.map_err(Error::sink)?
      else {
        warn!(snapshot, "no snapshot to publish");
        continue;
      };
      let rows = warehouse
        .replace_table(table, data)
        .await
        .map_err(Error::sink)?;
      loaded.push((table.to_string(), rows));
    }
    Ok(loaded)
  }

  // ── Steps ─────────────────────────────────────────────────────────────────

  /// Fetch the month and land it in bronze. Nothing is written unless the
  /// fetch succeeded.
  async fn fetch(&self, batch: Batch) -> Result<usize> {
    let secs = self.config.fetch_timeout_secs;
    let games = tokio::time::timeout(
      Duration::from_secs(secs),
      self.source.fetch_games(&self.config.username, batch),
    )
    .await
    .map_err(|_| Error::fetch(FetchError::Timeout { secs }))?
    .map_err(Error::fetch)?;

    let key = batch.bronze_key();
    let bytes = serde_json::to_vec(&games).map_err(gambit_core::Error::from)?;
    self.lake.put_blob(&key, bytes).await.map_err(Error::sink)?;
    info!(games = games.len(), %key, "landed bronze archive");
    Ok(games.len())
  }

  /// Parse the bronze archive into the silver snapshot. Games whose
  /// notation cannot be parsed are logged and skipped.
  async fn parse(
    &self,
    batch: Batch,
    last_updated: NaiveDateTime,
  ) -> Result<(Vec<ParsedGame>, usize)> {
    let key = batch.bronze_key();
    let bytes = self
      .lake
      .get_blob(&key)
      .await
      .map_err(Error::sink)?
      .ok_or_else(|| Error::MissingBronze(key.clone()))?;
    let raw: Vec<RawGame> = serde_json::from_slice(&bytes)?;

    let mut parsed = Vec::with_capacity(raw.len());
    let mut skipped = 0;
    for game in &raw {
      match gambit_pgn::parse_game(game, last_updated) {
        Ok(row) => parsed.push(row),
        Err(e) => {
          skipped += 1;
          warn!(game_url = %game.url, error = %e, "skipping game");
        }
      }
    }

    let silver = batch.silver_key();
    self
      .lake
      .write_table(&silver, Table::from_rows(&parsed))
      .await
      .map_err(Error::sink)?;
    info!(rows = parsed.len(), skipped, key = %silver, "wrote silver snapshot");
    Ok((parsed, skipped))
  }

  /// Read a cumulative snapshot as typed rows; `None` if it does not exist.
  async fn read_rows<T: Tabular>(&self, key: &str) -> Result<Option<Vec<T>>> {
    match self.lake.read_table(key).await.map_err(Error::sink)? {
      Some(table) => Ok(Some(table.to_rows()?)),
      None => Ok(None),
    }
  }

  async fn update_dimension<D: Dimension>(&self, candidates: Vec<D>) -> Result<Vec<D>> {
    let existing = self.read_rows::<D>(D::SNAPSHOT).await?;
    let before = existing.as_ref().map_or(0, Vec::len);

    let merged = merge_dimension(existing, candidates);
    self
      .lake
      .write_table(D::SNAPSHOT, Table::from_rows(&merged))
      .await
      .map_err(Error::sink)?;

    info!(
      snapshot = D::SNAPSHOT,
      rows = merged.len(),
      added = merged.len().saturating_sub(before),
      "merged dimension"
    );
    Ok(merged)
  }

  async fn update_facts(&self, parsed: &[ParsedGame], dims: &DimensionSet) -> Result<usize> {
    let current = build_fact_rows(parsed, dims, &self.config.username);
    let previous = self.read_rows::<FactRow>(FactRow::SNAPSHOT).await?;

    let merged = merge_facts(previous, current);
    ensure_unique_urls(&merged).map_err(Error::MergeInvariant)?;

    self
      .lake
      .write_table(FactRow::SNAPSHOT, Table::from_rows(&merged))
      .await
      .map_err(Error::sink)?;
    info!(rows = merged.len(), "wrote fact snapshot");
    Ok(merged.len())
  }
}
