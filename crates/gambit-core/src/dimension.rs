//! Dimension tables and the incremental merge rule shared by all of them.
//!
//! Dimensions are append-only: a run reads the existing snapshot, appends
//! candidate rows whose natural key is not yet present, and writes the whole
//! snapshot back. An existing row is never rewritten, so the first value
//! recorded for a key wins across runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::{
  Result,
  batch::{DIM_DATE, DIM_OPENINGS, DIM_RESULTS, DIM_TIME_CONTROL},
  table::{DataType, Field, RowReader, Tabular, Value},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A deduplicated lookup table keyed by a natural attribute.
pub trait Dimension: Tabular + Clone {
  type Key: Ord + Clone + std::fmt::Debug;

  /// Lake key of the cumulative snapshot.
  const SNAPSHOT: &'static str;

  /// Warehouse table name.
  const TABLE: &'static str;

  fn key(&self) -> Self::Key;
}

/// Merge `candidates` into the `existing` snapshot.
///
/// Existing rows keep their order (a duplicated key keeps its first row).
/// Candidates whose key is absent are deduplicated among themselves, first
/// row wins, and appended in key order. With no existing snapshot the result
/// is the deduplicated candidates.
pub fn merge_dimension<D, I>(existing: Option<Vec<D>>, candidates: I) -> Vec<D>
where
  D: Dimension,
  I: IntoIterator<Item = D>,
{
  let mut seen = BTreeSet::new();
  let mut merged: Vec<D> = existing
    .into_iter()
    .flatten()
    .filter(|row| seen.insert(row.key()))
    .collect();

  let mut fresh: BTreeMap<D::Key, D> = BTreeMap::new();
  for row in candidates {
    let key = row.key();
    if !seen.contains(&key) {
      fresh.entry(key).or_insert(row);
    }
  }

  merged.extend(fresh.into_values());
  merged
}

// ─── Date ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDim {
  pub game_date:  NaiveDate,
  pub year:       i64,
  pub month:      i64,
  /// English month name, e.g. `"March"`.
  pub month_name: String,
  pub day:        i64,
  /// English weekday name, e.g. `"Tuesday"`.
  pub weekday:    String,
  pub quarter:    i64,
}

impl DateDim {
  pub fn from_date(game_date: NaiveDate) -> Self {
    let month = i64::from(game_date.month());
    Self {
      game_date,
      year: i64::from(game_date.year()),
      month,
      month_name: game_date.format("%B").to_string(),
      day: i64::from(game_date.day()),
      weekday: game_date.format("%A").to_string(),
      quarter: (month - 1) / 3 + 1,
    }
  }
}

impl Dimension for DateDim {
  type Key = NaiveDate;

  const SNAPSHOT: &'static str = DIM_DATE;
  const TABLE: &'static str = "dim_date";

  fn key(&self) -> NaiveDate { self.game_date }
}

impl Tabular for DateDim {
  fn fields() -> Vec<Field> {
    vec![
      Field::required("game_date", DataType::Date),
      Field::required("year", DataType::Int64),
      Field::required("month", DataType::Int64),
      Field::required("month_name", DataType::Utf8),
      Field::required("day", DataType::Int64),
      Field::required("weekday", DataType::Utf8),
      Field::required("quarter", DataType::Int64),
    ]
  }

  fn to_row(&self) -> Vec<Value> {
    vec![
      self.game_date.into(),
      self.year.into(),
      self.month.into(),
      self.month_name.clone().into(),
      self.day.into(),
      self.weekday.clone().into(),
      self.quarter.into(),
    ]
  }

  fn from_row(row: &RowReader<'_>) -> Result<Self> {
    Ok(Self {
      game_date:  row.date("game_date")?,
      year:       row.int64("year")?,
      month:      row.int64("month")?,
      month_name: row.utf8("month_name")?,
      day:        row.int64("day")?,
      weekday:    row.utf8("weekday")?,
      quarter:    row.int64("quarter")?,
    })
  }
}

// ─── Opening ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningDim {
  pub pgn_eco_url:       String,
  pub opening_name:      String,
  /// Empty when the slug could not be split.
  pub opening_family:    String,
  pub opening_variation: String,
  pub eco_code:          Option<String>,
}

impl Dimension for OpeningDim {
  type Key = String;

  const SNAPSHOT: &'static str = DIM_OPENINGS;
  const TABLE: &'static str = "dim_openings";

  fn key(&self) -> String { self.pgn_eco_url.clone() }
}

impl Tabular for OpeningDim {
  fn fields() -> Vec<Field> {
    vec![
      Field::required("pgn_eco_url", DataType::Utf8),
      Field::required("opening_name", DataType::Utf8),
      Field::required("opening_family", DataType::Utf8),
      Field::required("opening_variation", DataType::Utf8),
      Field::nullable("eco_code", DataType::Utf8),
    ]
  }

  fn to_row(&self) -> Vec<Value> {
    vec![
      self.pgn_eco_url.clone().into(),
      self.opening_name.clone().into(),
      self.opening_family.clone().into(),
      self.opening_variation.clone().into(),
      self.eco_code.clone().into(),
    ]
  }

  fn from_row(row: &RowReader<'_>) -> Result<Self> {
    Ok(Self {
      pgn_eco_url:       row.utf8("pgn_eco_url")?,
      opening_name:      row.utf8("opening_name")?,
      opening_family:    row.utf8("opening_family")?,
      opening_variation: row.utf8("opening_variation")?,
      eco_code:          row.opt_utf8("eco_code")?,
    })
  }
}

// ─── Time control ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeControlDim {
  /// The formatted label, e.g. `"3+2"` or `"Daily (1 day per move)"`.
  pub time_control: String,
  pub time_class:   String,
}

impl Dimension for TimeControlDim {
  type Key = String;

  const SNAPSHOT: &'static str = DIM_TIME_CONTROL;
  const TABLE: &'static str = "dim_time_control";

  fn key(&self) -> String { self.time_control.clone() }
}

impl Tabular for TimeControlDim {
  fn fields() -> Vec<Field> {
    vec![
      Field::required("time_control", DataType::Utf8),
      Field::required("time_class", DataType::Utf8),
    ]
  }

  fn to_row(&self) -> Vec<Value> {
    vec![
      self.time_control.clone().into(),
      self.time_class.clone().into(),
    ]
  }

  fn from_row(row: &RowReader<'_>) -> Result<Self> {
    Ok(Self {
      time_control: row.utf8("time_control")?,
      time_class:   row.utf8("time_class")?,
    })
  }
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// Result codes known to the archive API: (code, outcome, description).
const RESULT_CODES: &[(&str, &str, &str)] = &[
  ("win", "Win", "Win"),
  ("checkmated", "Loss", "Checkmated"),
  ("agreed", "Draw", "Draw agreed"),
  ("repetition", "Draw", "Draw by repetition"),
  ("timeout", "Win", "Timeout"),
  ("resigned", "Loss", "Resigned"),
  ("stalemate", "Draw", "Stalemate"),
  ("lose", "Loss", "Lose"),
  ("insufficient", "Draw", "Insufficient material"),
  ("50move", "Draw", "Draw by 50-move rule"),
  ("abandoned", "Draw", "Abandoned"),
  ("kingofthehill", "Win", "Opponent king reached the hill"),
  ("threecheck", "Win", "Checked for the 3rd time"),
  (
    "timevsinsufficient",
    "Draw",
    "Draw by timeout vs insufficient material",
  ),
  ("bughousepartnerlose", "Loss", "Bughouse partner lost"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDim {
  pub result_code: String,
  /// `"Win"`, `"Loss"`, `"Draw"`, or `"Unknown"` for codes outside the
  /// known set.
  pub result:      String,
  pub description: String,
}

impl ResultDim {
  /// One row per known result code.
  pub fn seed() -> Vec<Self> {
    RESULT_CODES
      .iter()
      .map(|(code, result, description)| Self {
        result_code: code.to_string(),
        result:      result.to_string(),
        description: description.to_string(),
      })
      .collect()
  }

  /// The row for a code seen in a batch.
  pub fn observed(code: &str) -> Self {
    match RESULT_CODES.iter().find(|(c, ..)| *c == code) {
      Some((code, result, description)) => Self {
        result_code: code.to_string(),
        result:      result.to_string(),
        description: description.to_string(),
      },
      None => Self {
        result_code: code.to_string(),
        result:      "Unknown".to_string(),
        description: code.to_string(),
      },
    }
  }
}

impl Dimension for ResultDim {
  type Key = String;

  const SNAPSHOT: &'static str = DIM_RESULTS;
  const TABLE: &'static str = "dim_results";

  fn key(&self) -> String { self.result_code.clone() }
}

impl Tabular for ResultDim {
  fn fields() -> Vec<Field> {
    vec![
      Field::required("result_code", DataType::Utf8),
      Field::required("result", DataType::Utf8),
      Field::required("description", DataType::Utf8),
    ]
  }

  fn to_row(&self) -> Vec<Value> {
    vec![
      self.result_code.clone().into(),
      self.result.clone().into(),
      self.description.clone().into(),
    ]
  }

  fn from_row(row: &RowReader<'_>) -> Result<Self> {
    Ok(Self {
      result_code: row.utf8("result_code")?,
      result:      row.utf8("result")?,
      description: row.utf8("description")?,
    })
  }
}
