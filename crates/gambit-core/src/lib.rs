//! Core types and trait definitions for the gambit chess-history pipeline.
//!
//! This crate is deliberately free of HTTP, Parquet, and database
//! dependencies. Every other crate depends on it; the merge and dedup rules
//! that shape the gold layer live here as plain functions over in-memory
//! rows.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod batch;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod game;
pub mod store;
pub mod table;

pub use batch::Batch;
pub use error::{Error, Result};
