//! The steps of a batch run, in execution order.
//!
//! ```text
//! Fetch → Parse → DimDate → DimOpenings → DimTimeControl → DimResults
//!       → Fact → Publish
//! ```
//!
//! Each step fully materialises its output before the next begins. A failed
//! step ends the run; nothing after it executes, so the warehouse is only
//! touched once the fact snapshot has been written.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  /// Download the month's archive and land it in bronze.
  Fetch,
  /// Derive silver rows from the bronze archive.
  Parse,
  DimDate,
  DimOpenings,
  DimTimeControl,
  DimResults,
  /// Join, merge, and write the cumulative fact snapshot.
  Fact,
  /// Replace the warehouse tables with the gold snapshots.
  Publish,
}

impl Step {
  pub const ALL: [Step; 8] = [
    Step::Fetch,
    Step::Parse,
    Step::DimDate,
    Step::DimOpenings,
    Step::DimTimeControl,
    Step::DimResults,
    Step::Fact,
    Step::Publish,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Fetch => "fetch",
      Self::Parse => "parse",
      Self::DimDate => "dim_date",
      Self::DimOpenings => "dim_openings",
      Self::DimTimeControl => "dim_time_control",
      Self::DimResults => "dim_results",
      Self::Fact => "fact",
      Self::Publish => "publish",
    }
  }

  /// The step that runs after this one, if any.
  pub fn next(&self) -> Option<Step> {
    let idx = Self::ALL.iter().position(|s| s == self)?;
    Self::ALL.get(idx + 1).copied()
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
