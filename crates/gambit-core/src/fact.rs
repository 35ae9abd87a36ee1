//! The published fact table: one row per game, seen from one player's side.
//!
//! Building a batch of fact rows is a left join of the parsed games against
//! the four dimension snapshots; a missing dimension key leaves the derived
//! columns null and never drops the game. Merging with the previous snapshot
//! keeps, for every game URL, the row with the latest `last_updated`.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  batch::FACT_GAMES,
  dimension::{DateDim, OpeningDim, ResultDim, TimeControlDim},
  game::ParsedGame,
  table::{DataType, Field, RowReader, Tabular, Value},
};

/// Warehouse table name of the fact snapshot.
pub const FACT_TABLE: &str = "fact_games";

// ─── Perspective ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
  White,
  Black,
}

impl Color {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::White => "white",
      Self::Black => "black",
    }
  }

  /// The side `username` played. Usernames compare ASCII
  /// case-insensitively; when white is not `username` the player is taken
  /// to be black.
  pub fn of(username: &str, game: &ParsedGame) -> Self {
    match &game.pgn_white_user {
      Some(white) if white.eq_ignore_ascii_case(username) => Self::White,
      _ => Self::Black,
    }
  }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
  pub game_url:           String,
  pub game_date:          Option<NaiveDate>,
  pub start_time:         Option<NaiveDateTime>,
  pub end_time:           Option<NaiveDateTime>,
  pub game_duration_secs: Option<i64>,
  pub time_control:       String,
  pub my_color:           String,
  pub my_username:        Option<String>,
  pub opponent_username:  Option<String>,
  pub my_rating:          i64,
  pub opponent_rating:    i64,
  pub my_result:          String,
  pub opponent_result:    String,
  pub game_fen:           Option<String>,
  pub opening_url:        Option<String>,
  pub game_pgn:           String,
  pub moves:              i64,
  pub last_updated:       NaiveDateTime,
  // Dimension-derived; null when the join found no match.
  pub weekday:            Option<String>,
  pub opening_name:       Option<String>,
  pub opening_family:     Option<String>,
  pub time_class:         Option<String>,
  pub my_outcome:         Option<String>,
  pub opponent_outcome:   Option<String>,
}

impl FactRow {
  pub const SNAPSHOT: &'static str = FACT_GAMES;
}

impl Tabular for FactRow {
  fn fields() -> Vec<Field> {
    use DataType::*;
    vec![
      Field::required("game_url", Utf8),
      Field::nullable("game_date", Date),
      Field::nullable("start_time", Timestamp),
      Field::nullable("end_time", Timestamp),
      Field::nullable("game_duration_secs", Int64),
      Field::required("time_control", Utf8),
      Field::required("my_color", Utf8),
      Field::nullable("my_username", Utf8),
      Field::nullable("opponent_username", Utf8),
      Field::required("my_rating", Int64),
      Field::required("opponent_rating", Int64),
      Field::required("my_result", Utf8),
      Field::required("opponent_result", Utf8),
      Field::nullable("game_fen", Utf8),
      Field::nullable("opening_url", Utf8),
      Field::required("game_pgn", Utf8),
      Field::required("moves", Int64),
      Field::required("last_updated", Timestamp),
      Field::nullable("weekday", Utf8),
      Field::nullable("opening_name", Utf8),
      Field::nullable("opening_family", Utf8),
      Field::nullable("time_class", Utf8),
      Field::nullable("my_outcome", Utf8),
      Field::nullable("opponent_outcome", Utf8),
    ]
  }

  fn to_row(&self) -> Vec<Value> {
    vec![
      self.game_url.clone().into(),
      self.game_date.into(),
      self.start_time.into(),
      self.end_time.into(),
      self.game_duration_secs.into(),
      self.time_control.clone().into(),
      self.my_color.clone().into(),
      self.my_username.clone().into(),
      self.opponent_username.clone().into(),
      self.my_rating.into(),
      self.opponent_rating.into(),
      self.my_result.clone().into(),
      self.opponent_result.clone().into(),
      self.game_fen.clone().into(),
      self.opening_url.clone().into(),
      self.game_pgn.clone().into(),
      self.moves.into(),
      self.last_updated.into(),
      self.weekday.clone().into(),
      self.opening_name.clone().into(),
      self.opening_family.clone().into(),
      self.time_class.clone().into(),
      self.my_outcome.clone().into(),
      self.opponent_outcome.clone().into(),
    ]
  }

  fn from_row(row: &RowReader<'_>) -> Result<Self> {
    Ok(Self {
      game_url:           row.utf8("game_url")?,
      game_date:          row.opt_date("game_date")?,
      start_time:         row.opt_timestamp("start_time")?,
      end_time:           row.opt_timestamp("end_time")?,
      game_duration_secs: row.opt_int64("game_duration_secs")?,
      time_control:       row.utf8("time_control")?,
      my_color:           row.utf8("my_color")?,
      my_username:        row.opt_utf8("my_username")?,
      opponent_username:  row.opt_utf8("opponent_username")?,
      my_rating:          row.int64("my_rating")?,
      opponent_rating:    row.int64("opponent_rating")?,
      my_result:          row.utf8("my_result")?,
      opponent_result:    row.utf8("opponent_result")?,
      game_fen:           row.opt_utf8("game_fen")?,
      opening_url:        row.opt_utf8("opening_url")?,
      game_pgn:           row.utf8("game_pgn")?,
      moves:              row.int64("moves")?,
      last_updated:       row.timestamp("last_updated")?,
      weekday:            row.opt_utf8("weekday")?,
      opening_name:       row.opt_utf8("opening_name")?,
      opening_family:     row.opt_utf8("opening_family")?,
      time_class:         row.opt_utf8("time_class")?,
      my_outcome:         row.opt_utf8("my_outcome")?,
      opponent_outcome:   row.opt_utf8("opponent_outcome")?,
    })
  }
}

// ─── Build ───────────────────────────────────────────────────────────────────

/// The four dimension snapshots a fact batch is joined against.
#[derive(Debug, Clone, Default)]
pub struct DimensionSet {
  pub dates:         Vec<DateDim>,
  pub openings:      Vec<OpeningDim>,
  pub time_controls: Vec<TimeControlDim>,
  pub results:       Vec<ResultDim>,
}

/// Left-join `parsed` against `dims` from the point of view of
/// `perspective` (a username). Produces exactly one row per input game.
pub fn build_fact_rows(
  parsed: &[ParsedGame],
  dims: &DimensionSet,
  perspective: &str,
) -> Vec<FactRow> {
  let dates: HashMap<NaiveDate, &DateDim> =
    dims.dates.iter().map(|d| (d.game_date, d)).collect();
  let openings: HashMap<&str, &OpeningDim> = dims
    .openings
    .iter()
    .map(|o| (o.pgn_eco_url.as_str(), o))
    .collect();
  let time_controls: HashMap<&str, &TimeControlDim> = dims
    .time_controls
    .iter()
    .map(|t| (t.time_control.as_str(), t))
    .collect();
  let results: HashMap<&str, &ResultDim> = dims
    .results
    .iter()
    .map(|r| (r.result_code.as_str(), r))
    .collect();

  parsed
    .iter()
    .map(|game| {
      let color = Color::of(perspective, game);
      let (me, them) = match color {
        Color::White => (
          (&game.pgn_white_user, game.white_rating, &game.white_result),
          (&game.pgn_black_user, game.black_rating, &game.black_result),
        ),
        Color::Black => (
          (&game.pgn_black_user, game.black_rating, &game.black_result),
          (&game.pgn_white_user, game.white_rating, &game.white_result),
        ),
      };

      let date = game.game_date.and_then(|d| dates.get(&d));
      let opening = game
        .pgn_eco_url
        .as_deref()
        .and_then(|u| openings.get(u));
      let time_control = time_controls.get(game.time_control_label.as_str());
      let outcome =
        |code: &str| results.get(code).map(|r| r.result.clone());

      FactRow {
        game_url:           game.game_url.clone(),
        game_date:          game.game_date,
        start_time:         game.start_time,
        end_time:           game.end_time,
        game_duration_secs: game.game_duration_secs,
        time_control:       game.time_control_label.clone(),
        my_color:           color.as_str().to_string(),
        my_username:        me.0.clone(),
        opponent_username:  them.0.clone(),
        my_rating:          me.1,
        opponent_rating:    them.1,
        my_result:          me.2.clone(),
        opponent_result:    them.2.clone(),
        game_fen:           game.pgn_current_position.clone(),
        opening_url:        game.pgn_eco_url.clone(),
        game_pgn:           game.pgn_trans.clone(),
        moves:              game.moves,
        last_updated:       game.last_updated,
        weekday:            date.map(|d| d.weekday.clone()),
        opening_name:       opening.map(|o| o.opening_name.clone()),
        opening_family:     opening.map(|o| o.opening_family.clone()),
        time_class:         time_control.map(|t| t.time_class.clone()),
        my_outcome:         outcome(me.2.as_str()),
        opponent_outcome:   outcome(them.2.as_str()),
      }
    })
    .collect()
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Union `previous` and `current`, keeping one row per `game_url`: the one
/// with the greatest `last_updated`. On a tie the row later in union order
/// wins, so the current batch overrides the previous snapshot. Output is
/// sorted by `game_url`.
pub fn merge_facts(
  previous: Option<Vec<FactRow>>,
  current: Vec<FactRow>,
) -> Vec<FactRow> {
  let mut latest: BTreeMap<String, FactRow> = BTreeMap::new();
  for row in previous.into_iter().flatten().chain(current) {
    match latest.get(&row.game_url) {
      Some(kept) if kept.last_updated > row.last_updated => {}
      _ => {
        latest.insert(row.game_url.clone(), row);
      }
    }
  }
  latest.into_values().collect()
}

/// Fail if any game URL appears more than once.
pub fn ensure_unique_urls(rows: &[FactRow]) -> Result<()> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for row in rows {
    *counts.entry(row.game_url.as_str()).or_default() += 1;
  }
  match counts.into_iter().find(|(_, n)| *n > 1) {
    Some((url, count)) => Err(Error::DuplicateGameUrl {
      game_url: url.to_string(),
      count,
    }),
    None => Ok(()),
  }
}
