//! Error types for `gambit-pipeline`.

use thiserror::Error;

use gambit_core::Batch;

use crate::step::Step;

/// A collaborator's error, erased so one pipeline can mix backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a request to the archive API failed.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("GET {url} → {status}")]
  Status { url: String, status: u16 },

  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("no response within {secs}s")]
  Timeout { secs: u64 },

  #[error("unexpected archive URL: {0:?}")]
  Decode(String),
}

/// The failure of a single step.
#[derive(Debug, Error)]
pub enum Error {
  #[error("fetch failed: {0}")]
  Fetch(#[source] BoxError),

  #[error("sink write failed: {0}")]
  Sink(#[source] BoxError),

  /// A fact snapshot with two rows for one game must never be written.
  #[error("merge invariant violated: {0}")]
  MergeInvariant(#[source] gambit_core::Error),

  #[error("no warehouse configured")]
  NoWarehouse,

  #[error("bronze archive {0} is missing")]
  MissingBronze(String),

  #[error("bronze archive is not valid JSON: {0}")]
  Bronze(#[from] serde_json::Error),

  #[error(transparent)]
  Core(#[from] gambit_core::Error),
}

impl Error {
  pub(crate) fn fetch<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Fetch(Box::new(e))
  }

  pub(crate) fn sink<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Sink(Box::new(e))
  }
}

/// A step failure tagged with where it happened. Aborts the run.
#[derive(Debug, Error)]
#[error("step {step} failed for batch {batch}: {source}")]
pub struct RunError {
  pub batch:  Batch,
  pub step:   Step,
  #[source]
  pub source: Error,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
