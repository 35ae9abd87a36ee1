//! Error type for `gambit-store-lake`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] gambit_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("arrow error: {0}")]
  Arrow(#[from] arrow::error::ArrowError),

  #[error("parquet error: {0}")]
  Parquet(#[from] parquet::errors::ParquetError),

  #[error("blocking task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  /// Keys are relative paths below the lake root.
  #[error("invalid lake key: {0:?}")]
  InvalidKey(String),

  #[error("column {column} has unsupported type {data_type}")]
  UnsupportedColumn { column: String, data_type: String },

  #[error("value out of range in column {0}")]
  OutOfRange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
