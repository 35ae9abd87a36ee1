//! Batch identifiers and the logical data-lake layout.
//!
//! One pipeline run processes exactly one `(year, month)` batch. The bronze
//! and silver objects are per batch; the gold objects are cumulative
//! snapshots shared by every run.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Lake keys ───────────────────────────────────────────────────────────────

/// Cumulative opening dimension snapshot.
pub const DIM_OPENINGS: &str = "gold/dim_openings.parquet";
/// Cumulative calendar-date dimension snapshot.
pub const DIM_DATE: &str = "gold/dim_date.parquet";
/// Cumulative time-control dimension snapshot.
pub const DIM_TIME_CONTROL: &str = "gold/dim_time_control.parquet";
/// Cumulative result-code dimension snapshot.
pub const DIM_RESULTS: &str = "gold/dim_results.parquet";
/// Cumulative fact snapshot; one row per game URL.
pub const FACT_GAMES: &str = "gold/fact-games.parquet";

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A calendar month of games. Orders chronologically.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Batch {
  year:  i32,
  month: u32,
}

impl Batch {
  pub fn new(year: i32, month: u32) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(Error::InvalidBatch(format!("{year}-{month}")));
    }
    Ok(Self { year, month })
  }

  pub fn year(&self) -> i32 { self.year }

  pub fn month(&self) -> u32 { self.month }

  /// The following calendar month.
  pub fn next(&self) -> Self {
    if self.month == 12 {
      Self {
        year:  self.year + 1,
        month: 1,
      }
    } else {
      Self {
        year:  self.year,
        month: self.month + 1,
      }
    }
  }

  /// Every batch from `self` through `last`, inclusive. Empty when `last`
  /// precedes `self`.
  pub fn through(self, last: Batch) -> impl Iterator<Item = Batch> {
    std::iter::successors(Some(self), |b| Some(b.next()))
      .take_while(move |b| *b <= last)
  }

  /// `bronze/{year}-{month:02}-games.json`
  pub fn bronze_key(&self) -> String {
    format!("bronze/{}-{:02}-games.json", self.year, self.month)
  }

  /// `silver/fact-{year}-{month:02}-games.parquet`
  pub fn silver_key(&self) -> String {
    format!("silver/fact-{}-{:02}-games.parquet", self.year, self.month)
  }
}

impl fmt::Display for Batch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{:02}", self.year, self.month)
  }
}

/// Accepts `YYYY-MM` and `YYYY/MM`.
impl FromStr for Batch {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidBatch(s.to_string());
    let (year, month) = s
      .trim()
      .split_once(['-', '/'])
      .ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    Batch::new(year, month).map_err(|_| invalid())
  }
}
