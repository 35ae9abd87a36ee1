//! PGN codec for gambit.
//!
//! Turns archive entries into silver-layer [`ParsedGame`] rows, and provides
//! the opening classifier and time-control formatter the dimension builders
//! use. Pure synchronous; no HTTP or storage dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use gambit_pgn::{number_moves, parse};
//!
//! let blob = "[Event \"Live Chess\"]\n\n1. e4 {[%clk 0:02:59]} 1... e5 *";
//! let pgn = parse(blob).unwrap();
//! assert_eq!(number_moves(&pgn.moves), "1. e4 e5");
//! ```

pub mod error;
mod opening;
mod parse;
mod time_control;

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
pub use error::{Error, Result};
use gambit_core::game::{ParsedGame, RawGame};
pub use opening::{Opening, classify_opening};
pub use time_control::{TimeControl, format_time_control};

// ─── Public types ────────────────────────────────────────────────────────────

/// The recognised contents of one notation blob. Every tag is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPgn {
  pub event:            Option<String>,
  pub site:             Option<String>,
  pub date:             Option<NaiveDate>,
  pub white:            Option<String>,
  pub black:            Option<String>,
  pub result:           Option<String>,
  pub current_position: Option<String>,
  pub timezone:         Option<String>,
  pub eco:              Option<String>,
  pub eco_url:          Option<String>,
  pub start_time:       Option<NaiveTime>,
  pub end_date:         Option<NaiveDate>,
  pub end_time:         Option<NaiveTime>,
  /// Plies in order, without numbers or annotations.
  pub moves:            Vec<String>,
}

impl ParsedPgn {
  /// `Date` + `StartTime`.
  pub fn started_at(&self) -> Option<NaiveDateTime> {
    Some(self.date?.and_time(self.start_time?))
  }

  /// `EndDate` + `EndTime`. Never borrows the start date, so a game that
  /// crosses midnight ends on the following day.
  pub fn ended_at(&self) -> Option<NaiveDateTime> {
    Some(self.end_date?.and_time(self.end_time?))
  }

  pub fn duration_secs(&self) -> Option<i64> {
    Some((self.ended_at()? - self.started_at()?).num_seconds())
  }

  /// Full moves; a final white move without a reply counts as one.
  pub fn full_moves(&self) -> i64 { self.moves.len().div_ceil(2) as i64 }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse a single notation blob.
///
/// Missing tags come back as `None`. Fails only with
/// [`Error::Unparseable`] when the blob holds neither tags nor numbered
/// moves.
pub fn parse(blob: &str) -> Result<ParsedPgn> { parse::parse_blob(blob) }

/// Re-annotate plies with move numbers, white and black alternating from
/// move 1: `[a, b, c, d, e]` → `"1. a b 2. c d 3. e"`.
pub fn number_moves<S: AsRef<str>>(plies: &[S]) -> String {
  let mut out = String::new();
  for (i, pair) in plies.chunks(2).enumerate() {
    if i > 0 {
      out.push(' ');
    }
    let _ = write!(out, "{}.", i + 1);
    for ply in pair {
      out.push(' ');
      out.push_str(ply.as_ref());
    }
  }
  out
}

fn non_empty(s: &str) -> Option<String> {
  (!s.is_empty()).then(|| s.to_string())
}

/// Derive the silver-layer row for `raw`, stamped with `last_updated`.
///
/// Player names fall back to the archive's `username` fields when the blob
/// has no `White`/`Black` tags.
pub fn parse_game(raw: &RawGame, last_updated: NaiveDateTime) -> Result<ParsedGame> {
  let blob = raw
    .pgn
    .as_deref()
    .ok_or_else(|| Error::MissingNotation(raw.url.clone()))?;
  let pgn = parse(blob)?;

  Ok(ParsedGame {
    game_url: raw.url.clone(),
    time_control: raw.time_control.clone(),
    time_control_label: format_time_control(&raw.time_control),
    rated: raw.rated,
    time_class: raw.time_class.clone(),
    rules: raw.rules.clone(),
    white_rating: raw.white.rating,
    white_result: raw.white.result.clone(),
    black_rating: raw.black.rating,
    black_result: raw.black.result.clone(),
    game_date: pgn.date,
    start_time: pgn.started_at(),
    end_time: pgn.ended_at(),
    end_game_date: pgn.end_date,
    pgn_raw: pgn.moves.join(" "),
    pgn_trans: number_moves(&pgn.moves),
    game_duration_secs: pgn.duration_secs(),
    moves: pgn.full_moves(),
    plies: pgn.moves.len() as i64,
    last_updated,
    pgn_white_user: pgn.white.or_else(|| non_empty(&raw.white.username)),
    pgn_black_user: pgn.black.or_else(|| non_empty(&raw.black.username)),
    pgn_event: pgn.event,
    pgn_site: pgn.site,
    pgn_result: pgn.result,
    pgn_current_position: pgn.current_position,
    pgn_timezone: pgn.timezone,
    pgn_eco: pgn.eco,
    pgn_eco_url: pgn.eco_url,
  })
}
