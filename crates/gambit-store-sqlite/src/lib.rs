//! SQLite warehouse for gambit.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every load replaces the target
//! table wholesale and is recorded in a `load_log` table.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteWarehouse;

#[cfg(test)]
mod tests;
