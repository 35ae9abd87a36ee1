//! Time-control codes as reported by the archive API.
//!
//! | Raw | Parsed | Label |
//! |-----|--------|-------|
//! | `""`, `"-"`, `"0"` | [`TimeControl::Unlimited`] | `Unlimited` |
//! | `"300"` | [`TimeControl::Sudden`] | `5 min` |
//! | `"180+2"` | [`TimeControl::Increment`] | `3+2` |
//! | `"1/259200"` | [`TimeControl::Daily`] | `Daily (3 days per move)` |
//! | `"40/5400+30"` | [`TimeControl::Moves`] | `40 moves in 90 min +30s` |
//!
//! Anything else is [`TimeControl::Unrecognized`] and displays unchanged.

use std::fmt;

const SECS_PER_DAY: u32 = 86_400;
const SECS_PER_HOUR: u32 = 3_600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeControl {
  Unlimited,
  /// A single period with no increment.
  Sudden { base_secs: u32 },
  /// Fischer increment added after every move.
  Increment { base_secs: u32, increment_secs: u32 },
  /// Correspondence: a fixed allowance per move.
  Daily { secs_per_move: u32 },
  /// `moves` moves within `period_secs`, optionally with an increment.
  Moves {
    moves:          u32,
    period_secs:    u32,
    increment_secs: Option<u32>,
  },
  Unrecognized(String),
}

impl TimeControl {
  /// Parse a raw code. Never fails.
  pub fn parse(raw: &str) -> Self {
    let code = raw.trim();
    if matches!(code, "" | "-" | "0") {
      return Self::Unlimited;
    }
    Self::parse_structured(code).unwrap_or_else(|| Self::Unrecognized(raw.to_string()))
  }

  fn parse_structured(code: &str) -> Option<Self> {
    let num = |s: &str| s.trim().parse::<u32>().ok();

    if let Some((moves, rest)) = code.split_once('/') {
      let moves = num(moves)?;
      let (period_secs, increment_secs) = match rest.split_once('+') {
        Some((period, inc)) => (num(period)?, Some(num(inc)?)),
        None => (num(rest)?, None),
      };
      if moves == 0 {
        return None;
      }
      if period_secs == 0 {
        return Some(Self::Unlimited);
      }
      return Some(match (moves, increment_secs) {
        (1, None) => Self::Daily {
          secs_per_move: period_secs,
        },
        _ => Self::Moves {
          moves,
          period_secs,
          increment_secs,
        },
      });
    }

    if let Some((base, inc)) = code.split_once('+') {
      return Some(Self::Increment {
        base_secs:      num(base)?,
        increment_secs: num(inc)?,
      });
    }

    Some(Self::Sudden {
      base_secs: num(code)?,
    })
  }
}

/// Seconds as minutes, with up to two decimals for partial minutes.
fn minutes(secs: u32) -> String {
  if secs % 60 == 0 {
    return (secs / 60).to_string();
  }
  let formatted = format!("{:.2}", f64::from(secs) / 60.0);
  formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn plural(n: u32, unit: &str) -> String {
  if n == 1 {
    format!("{n} {unit}")
  } else {
    format!("{n} {unit}s")
  }
}

impl fmt::Display for TimeControl {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Unlimited => f.write_str("Unlimited"),
      Self::Sudden { base_secs } if *base_secs < 60 => {
        write!(f, "{base_secs} sec")
      }
      Self::Sudden { base_secs } => write!(f, "{} min", minutes(*base_secs)),
      Self::Increment {
        base_secs,
        increment_secs,
      } => write!(f, "{}+{increment_secs}", minutes(*base_secs)),
      Self::Daily { secs_per_move } => {
        let per_move = if secs_per_move % SECS_PER_DAY == 0 {
          plural(secs_per_move / SECS_PER_DAY, "day")
        } else if secs_per_move % SECS_PER_HOUR == 0 {
          plural(secs_per_move / SECS_PER_HOUR, "hour")
        } else if *secs_per_move < 60 {
          format!("{secs_per_move} sec")
        } else {
          format!("{} min", minutes(*secs_per_move))
        };
        write!(f, "Daily ({per_move} per move)")
      }
      Self::Moves {
        moves,
        period_secs,
        increment_secs,
      } => {
        write!(f, "{moves} moves in {} min", minutes(*period_secs))?;
        if let Some(inc) = increment_secs {
          write!(f, " +{inc}s")?;
        }
        Ok(())
      }
      Self::Unrecognized(raw) => f.write_str(raw),
    }
  }
}

/// The display label for a raw time-control code.
pub fn format_time_control(raw: &str) -> String {
  TimeControl::parse(raw).to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sudden_death_in_minutes() {
    assert_eq!(format_time_control("300"), "5 min");
    assert_eq!(format_time_control("600"), "10 min");
    assert_eq!(format_time_control("30"), "30 sec");
    assert_eq!(format_time_control("90"), "1.5 min");
  }

  #[test]
  fn increment() {
    assert_eq!(format_time_control("180+2"), "3+2");
    assert_eq!(format_time_control("60+1"), "1+1");
    assert_eq!(format_time_control("30+1"), "0.5+1");
    assert_eq!(format_time_control("20+1"), "0.33+1");
  }

  #[test]
  fn daily() {
    assert_eq!(format_time_control("1/86400"), "Daily (1 day per move)");
    assert_eq!(format_time_control("1/259200"), "Daily (3 days per move)");
    assert_eq!(format_time_control("1/43200"), "Daily (12 hours per move)");
  }

  #[test]
  fn daily_short_allowances() {
    assert_eq!(format_time_control("1/1"), "Daily (1 sec per move)");
    assert_eq!(format_time_control("1/45"), "Daily (45 sec per move)");
    assert_eq!(format_time_control("1/90"), "Daily (1.5 min per move)");
  }

  #[test]
  fn move_based() {
    assert_eq!(format_time_control("40/5400"), "40 moves in 90 min");
    assert_eq!(format_time_control("40/5400+30"), "40 moves in 90 min +30s");
    assert_eq!(
      TimeControl::parse("1/600+5"),
      TimeControl::Moves {
        moves:          1,
        period_secs:    600,
        increment_secs: Some(5),
      }
    );
  }

  #[test]
  fn unlimited_sentinels() {
    for raw in ["", "-", "0", " 0 ", "1/0"] {
      assert_eq!(TimeControl::parse(raw), TimeControl::Unlimited, "{raw:?}");
    }
  }

  #[test]
  fn unrecognized_passes_through() {
    assert_eq!(format_time_control("blitz"), "blitz");
    assert_eq!(format_time_control("3+x"), "3+x");
    assert_eq!(format_time_control("0/100"), "0/100");
  }
}
