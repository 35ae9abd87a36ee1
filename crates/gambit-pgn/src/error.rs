//! Error types for the gambit-pgn codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The archive entry carries no `pgn` field at all.
  #[error("game {0} has no notation blob")]
  MissingNotation(String),

  /// Neither a single tag pair nor a single numbered SAN move could be
  /// recognised.
  #[error("notation blob has no tags and no moves")]
  Unparseable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
