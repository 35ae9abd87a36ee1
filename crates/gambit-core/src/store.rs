//! Collaborator traits: where games come from and where layers are written.
//!
//! The pipeline depends on these abstractions, not on any concrete backend.
//! `gambit-pipeline` provides the HTTP [`GameSource`], `gambit-store-lake`
//! the [`BlobStore`] and [`SnapshotStore`], and `gambit-store-sqlite` the
//! [`Warehouse`].
//!
//! Every write has overwrite semantics: re-running a batch replaces what the
//! previous run wrote under the same key. None of these writes are atomic
//! with respect to each other, so callers must run at most one writer per
//! key at a time.

use std::future::Future;

use crate::{batch::Batch, game::RawGame, table::Table};

// ─── Source ──────────────────────────────────────────────────────────────────

/// A remote archive of one user's games, partitioned by month.
pub trait GameSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All games `username` played during `batch`. An empty archive is
  /// `Ok(vec![])`; a transport failure or non-2xx response is an error.
  fn fetch_games<'a>(
    &'a self,
    username: &'a str,
    batch: Batch,
  ) -> impl Future<Output = Result<Vec<RawGame>, Self::Error>> + Send + 'a;

  /// The batches for which the source has an archive, oldest first.
  fn archives<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Vec<Batch>, Self::Error>> + Send + 'a;
}

// ─── Lake ────────────────────────────────────────────────────────────────────

/// Opaque byte objects addressed by key (the bronze layer).
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write `bytes` under `key`, replacing any previous object.
  fn put_blob<'a>(
    &'a self,
    key: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Read the object under `key`. Returns `None` if it does not exist.
  fn get_blob<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + 'a;
}

/// Columnar table snapshots addressed by key (the silver and gold layers).
pub trait SnapshotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the snapshot under `key`. Returns `None` if it does not exist yet.
  fn read_table<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Table>, Self::Error>> + Send + 'a;

  /// Write `table` under `key` as a whole-object replacement.
  fn write_table<'a>(
    &'a self,
    key: &'a str,
    table: Table,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// A relational sink loaded with replace-table semantics.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Drop and recreate table `name` with the contents of `table`. Returns
  /// the number of rows loaded.
  fn replace_table<'a>(
    &'a self,
    name: &'a str,
    table: Table,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
