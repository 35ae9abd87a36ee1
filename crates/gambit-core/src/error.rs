//! Error types for `gambit-core`.

use thiserror::Error;

use crate::table::DataType;

#[derive(Debug, Error)]
pub enum Error {
  /// More than one fact row survived deduplication for the same game.
  #[error("merge invariant violated: {count} fact rows for game {game_url}")]
  DuplicateGameUrl { game_url: String, count: usize },

  #[error("invalid batch identifier: {0:?}")]
  InvalidBatch(String),

  #[error("row has {found} values but the table has {expected} columns")]
  RowArity { expected: usize, found: usize },

  #[error("column {column}: expected {expected:?}, found {found:?}")]
  TypeMismatch {
    column:   String,
    expected: DataType,
    found:    DataType,
  },

  #[error("column {0} is not nullable")]
  UnexpectedNull(String),

  #[error("missing column: {0}")]
  MissingColumn(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
