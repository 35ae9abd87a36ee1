//! Error type for `gambit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Table names must be non-empty and must not clash with bookkeeping
  /// tables.
  #[error("invalid table name: {0:?}")]
  InvalidTableName(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
