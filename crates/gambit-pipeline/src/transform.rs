//! Dimension candidates derived from one batch of parsed games.
//!
//! Each builder emits one candidate per game that has the dimension's key;
//! deduplication is left to [`merge_dimension`].
//!
//! [`merge_dimension`]: gambit_core::dimension::merge_dimension

use gambit_core::{
  dimension::{DateDim, OpeningDim, ResultDim, TimeControlDim},
  game::ParsedGame,
};
use gambit_pgn::classify_opening;

pub fn date_candidates(games: &[ParsedGame]) -> Vec<DateDim> {
  games
    .iter()
    .filter_map(|g| g.game_date)
    .map(DateDim::from_date)
    .collect()
}

/// Games without an opening URL contribute nothing.
pub fn opening_candidates(games: &[ParsedGame]) -> Vec<OpeningDim> {
  games
    .iter()
    .filter_map(|g| {
      let url = g.pgn_eco_url.as_deref()?;
      let opening = classify_opening(url);
      Some(OpeningDim {
        pgn_eco_url:       url.to_string(),
        opening_name:      opening.name,
        opening_family:    opening.family,
        opening_variation: opening.variation,
        eco_code:          g.pgn_eco.clone(),
      })
    })
    .collect()
}

pub fn time_control_candidates(games: &[ParsedGame]) -> Vec<TimeControlDim> {
  games
    .iter()
    .map(|g| TimeControlDim {
      time_control: g.time_control_label.clone(),
      time_class:   g.time_class.clone(),
    })
    .collect()
}

/// The known result codes, followed by every code seen on either side.
/// Unknown codes become `Unknown` rows rather than being dropped.
pub fn result_candidates(games: &[ParsedGame]) -> Vec<ResultDim> {
  let observed = games
    .iter()
    .flat_map(|g| [g.white_result.as_str(), g.black_result.as_str()])
    .filter(|code| !code.is_empty())
    .map(ResultDim::observed);
  ResultDim::seed().into_iter().chain(observed).collect()
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use gambit_core::dimension::{Dimension, merge_dimension};

  use super::*;
  use crate::tests::parsed_game;

  #[test]
  fn dates_skip_games_without_a_date() {
    let mut undated = parsed_game("u2", "alice", "bob");
    undated.game_date = None;
    let dates = date_candidates(&[parsed_game("u1", "alice", "bob"), undated]);
    assert_eq!(dates.len(), 1);
    assert_eq!(dates[0].game_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
  }

  #[test]
  fn openings_are_classified_from_their_url() {
    let mut g = parsed_game("u1", "alice", "bob");
    g.pgn_eco_url =
      Some("https://www.chess.com/openings/Sicilian-Defense-Closed-Variation".into());
    g.pgn_eco = Some("B23".into());
    let mut no_url = parsed_game("u2", "alice", "bob");
    no_url.pgn_eco_url = None;

    let openings = opening_candidates(&[g, no_url]);
    assert_eq!(openings.len(), 1);
    assert_eq!(openings[0].opening_family, "Sicilian Defense");
    assert_eq!(openings[0].opening_variation, "Closed Variation");
    assert_eq!(openings[0].eco_code.as_deref(), Some("B23"));
  }

  #[test]
  fn unknown_result_codes_are_kept() {
    let mut g = parsed_game("u1", "alice", "bob");
    g.white_result = "stalemate".into();
    g.black_result = "cosmicray".into();

    let merged = merge_dimension(None, result_candidates(&[g]));
    assert_eq!(merged.len(), ResultDim::seed().len() + 1);
    let unknown = merged
      .iter()
      .find(|r| r.key() == "cosmicray")
      .expect("observed code present");
    assert_eq!(unknown.result, "Unknown");
  }

  #[test]
  fn time_controls_use_the_label() {
    let tcs = time_control_candidates(&[parsed_game("u1", "alice", "bob")]);
    assert_eq!(tcs[0].time_control, "3+2");
    assert_eq!(tcs[0].time_class, "blitz");
  }
}
