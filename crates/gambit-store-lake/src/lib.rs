//! Filesystem data lake for gambit.
//!
//! Bronze objects are stored as raw bytes; silver and gold snapshots are
//! Parquet files written through [`arrow`]. All file I/O runs on
//! [`tokio::task::spawn_blocking`] so the async runtime is never blocked.

mod columnar;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::LakeStore;

#[cfg(test)]
mod tests;
