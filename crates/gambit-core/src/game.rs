//! Game records: the raw archive entry and its parsed silver-layer form.
//!
//! A [`RawGame`] is immutable once fetched and identified by its URL. A
//! [`ParsedGame`] is derived from exactly one raw game and is only ever
//! re-derived wholesale; a newer `last_updated` supersedes an older row for
//! the same URL.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::{
  Result,
  table::{DataType, Field, RowReader, Tabular, Value},
};

// ─── Raw ─────────────────────────────────────────────────────────────────────

/// One side of a game as reported by the archive API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSide {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub rating:   i64,
  /// Per-side result code, e.g. `"win"`, `"resigned"`, `"timeout"`.
  #[serde(default)]
  pub result:   String,
  /// Fields not modelled here (`@id`, `uuid`, …), kept for the bronze copy.
  #[serde(flatten)]
  pub extra:    Map<String, Json>,
}

/// One entry of a monthly game archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGame {
  /// Globally unique game URL; the natural key of every downstream row.
  pub url:          String,
  /// The notation blob. Absent for some variants and unfinished games.
  #[serde(default)]
  pub pgn:          Option<String>,
  /// Raw time-control code: `"600"`, `"180+2"`, `"1/259200"`, …
  #[serde(default)]
  pub time_control: String,
  #[serde(default)]
  pub time_class:   String,
  #[serde(default)]
  pub rated:        bool,
  #[serde(default)]
  pub rules:        String,
  #[serde(default)]
  pub white:        PlayerSide,
  #[serde(default)]
  pub black:        PlayerSide,
  #[serde(flatten)]
  pub extra:        Map<String, Json>,
}

// ─── Parsed ──────────────────────────────────────────────────────────────────

/// The flat per-game record stored in the silver layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGame {
  pub game_url:             String,
  pub time_control:         String,
  /// Display form of `time_control`; the time-control dimension key.
  pub time_control_label:   String,
  pub rated:                bool,
  pub time_class:           String,
  pub rules:                String,
  pub white_rating:         i64,
  pub white_result:         String,
  pub black_rating:         i64,
  pub black_result:         String,
  pub pgn_event:            Option<String>,
  pub pgn_site:             Option<String>,
  pub game_date:            Option<NaiveDate>,
  pub pgn_white_user:       Option<String>,
  pub pgn_black_user:       Option<String>,
  pub pgn_result:           Option<String>,
  /// FEN of the final position.
  pub pgn_current_position: Option<String>,
  pub pgn_timezone:         Option<String>,
  pub pgn_eco:              Option<String>,
  pub pgn_eco_url:          Option<String>,
  pub start_time:           Option<NaiveDateTime>,
  pub end_time:             Option<NaiveDateTime>,
  pub end_game_date:        Option<NaiveDate>,
  /// Move tokens joined by single spaces, without numbers.
  pub pgn_raw:              String,
  /// Numbered movetext, e.g. `1. e4 e5 2. Nf3`.
  pub pgn_trans:            String,
  pub game_duration_secs:   Option<i64>,
  /// Full moves (a trailing white-only move counts as one).
  pub moves:                i64,
  pub plies:                i64,
  pub last_updated:         NaiveDateTime,
}

impl Tabular for ParsedGame {
  fn fields() -> Vec<Field> {
    use DataType::*;
    vec![
      Field::required("game_url", Utf8),
      Field::required("time_control", Utf8),
      Field::required("time_control_label", Utf8),
      Field::required("rated", Boolean),
      Field::required("time_class", Utf8),
      Field::required("rules", Utf8),
      Field::required("white_rating", Int64),
      Field::required("white_result", Utf8),
      Field::required("black_rating", Int64),
      Field::required("black_result", Utf8),
      Field::nullable("pgn_event", Utf8),
      Field::nullable("pgn_site", Utf8),
      Field::nullable("game_date", Date),
      Field::nullable("pgn_white_user", Utf8),
      Field::nullable("pgn_black_user", Utf8),
      Field::nullable("pgn_result", Utf8),
      Field::nullable("pgn_current_position", Utf8),
      Field::nullable("pgn_timezone", Utf8),
      Field::nullable("pgn_eco", Utf8),
      Field::nullable("pgn_eco_url", Utf8),
      Field::nullable("start_time", Timestamp),
      Field::nullable("end_time", Timestamp),
      Field::nullable("end_game_date", Date),
      Field::required("pgn_raw", Utf8),
      Field::required("pgn_trans", Utf8),
      Field::nullable("game_duration_secs", Int64),
      Field::required("moves", Int64),
      Field::required("plies", Int64),
      Field::required("last_updated", Timestamp),
    ]
  }

  fn to_row(&self) -> Vec<Value> {
    vec![
      self.game_url.clone().into(),
      self.time_control.clone().into(),
      self.time_control_label.clone().into(),
      self.rated.into(),
      self.time_class.clone().into(),
      self.rules.clone().into(),
      self.white_rating.into(),
      self.white_result.clone().into(),
      self.black_rating.into(),
      self.black_result.clone().into(),
      self.pgn_event.clone().into(),
      self.pgn_site.clone().into(),
      self.game_date.into(),
      self.pgn_white_user.clone().into(),
      self.pgn_black_user.clone().into(),
      self.pgn_result.clone().into(),
      self.pgn_current_position.clone().into(),
      self.pgn_timezone.clone().into(),
      self.pgn_eco.clone().into(),
      self.pgn_eco_url.clone().into(),
      self.start_time.into(),
      self.end_time.into(),
      self.end_game_date.into(),
      self.pgn_raw.clone().into(),
      self.pgn_trans.clone().into(),
      self.game_duration_secs.into(),
      self.moves.into(),
      self.plies.into(),
      self.last_updated.into(),
    ]
  }

  fn from_row(row: &RowReader<'_>) -> Result<Self> {
    Ok(Self {
      game_url:             row.utf8("game_url")?,
      time_control:         row.utf8("time_control")?,
      time_control_label:   row.utf8("time_control_label")?,
      rated:                row.boolean("rated")?,
      time_class:           row.utf8("time_class")?,
      rules:                row.utf8("rules")?,
      white_rating:         row.int64("white_rating")?,
      white_result:         row.utf8("white_result")?,
      black_rating:         row.int64("black_rating")?,
      black_result:         row.utf8("black_result")?,
      pgn_event:            row.opt_utf8("pgn_event")?,
      pgn_site:             row.opt_utf8("pgn_site")?,
      game_date:            row.opt_date("game_date")?,
      pgn_white_user:       row.opt_utf8("pgn_white_user")?,
      pgn_black_user:       row.opt_utf8("pgn_black_user")?,
      pgn_result:           row.opt_utf8("pgn_result")?,
      pgn_current_position: row.opt_utf8("pgn_current_position")?,
      pgn_timezone:         row.opt_utf8("pgn_timezone")?,
      pgn_eco:              row.opt_utf8("pgn_eco")?,
      pgn_eco_url:          row.opt_utf8("pgn_eco_url")?,
      start_time:           row.opt_timestamp("start_time")?,
      end_time:             row.opt_timestamp("end_time")?,
      end_game_date:        row.opt_date("end_game_date")?,
      pgn_raw:              row.utf8("pgn_raw")?,
      pgn_trans:            row.utf8("pgn_trans")?,
      game_duration_secs:   row.opt_int64("game_duration_secs")?,
      moves:                row.int64("moves")?,
      plies:                row.int64("plies")?,
      last_updated:         row.timestamp("last_updated")?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_game_keeps_unmodelled_fields() {
    let json = r#"{
      "url": "https://www.chess.com/game/live/1",
      "pgn": "[Event \"Live Chess\"]",
      "time_control": "600",
      "end_time": 1700000000,
      "rated": true,
      "time_class": "rapid",
      "rules": "chess",
      "white": {"rating": 1200, "result": "win", "username": "alice", "uuid": "w"},
      "black": {"rating": 1180, "result": "resigned", "username": "bob"}
    }"#;
    let game: RawGame = serde_json::from_str(json).unwrap();
    assert_eq!(game.white.rating, 1200);
    assert_eq!(game.black.result, "resigned");
    assert_eq!(game.extra["end_time"], 1_700_000_000);
    assert_eq!(game.white.extra["uuid"], "w");

    let back = serde_json::to_value(&game).unwrap();
    assert_eq!(back["end_time"], 1_700_000_000);
    assert_eq!(back["white"]["uuid"], "w");
  }

  #[test]
  fn raw_game_tolerates_missing_pgn() {
    let json = r#"{"url": "u", "white": {}, "black": {}}"#;
    let game: RawGame = serde_json::from_str(json).unwrap();
    assert!(game.pgn.is_none());
    assert!(game.time_control.is_empty());
  }
}
