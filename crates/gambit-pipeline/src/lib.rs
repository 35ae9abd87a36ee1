//! Batch ETL from the chess.com archive to a star-schema warehouse.
//!
//! A run processes one `(year, month)` [`Batch`] through the steps in
//! [`Step`]: the raw archive lands in bronze, parsed games in silver, and the
//! cumulative dimension and fact snapshots in gold. The gold snapshots are
//! then loaded into the warehouse with replace-table semantics.
//!
//! [`Pipeline`] is generic over its collaborators (see
//! [`gambit_core::store`]); [`ChessComClient`] is the production
//! [`GameSource`](gambit_core::store::GameSource).
//!
//! [`Batch`]: gambit_core::Batch

mod config;
mod fetch;
mod pipeline;
mod step;
mod transform;

pub mod error;

pub use config::PipelineConfig;
pub use error::{Error, FetchError, Result, RunError};
pub use fetch::ChessComClient;
pub use pipeline::{Pipeline, RunReport};
pub use step::Step;
