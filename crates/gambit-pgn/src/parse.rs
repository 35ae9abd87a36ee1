//! PGN tag-pair and movetext parser.
//!
//! Pipeline:
//!   raw &str
//!     ├─ extract_tags()     → first value per tag name
//!     └─ movetext()         → non-tag lines
//!          └─ strip_annotations() → comments, variations removed
//!               └─ tokenize_moves() → ordered plies
//!
//! Missing tags are `None`, never an error. Only a blob with no tags and no
//! moves at all is rejected.

use std::{collections::HashMap, sync::LazyLock};

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::{
  ParsedPgn,
  error::{Error, Result},
};

/// `[Name "value"]`, where the value may contain `\"` and `\\` escapes.
static TAG_PAIR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\[([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\s*\]"#)
    .expect("tag pair pattern is valid")
});

/// `12.` or `12...` ahead of a ply.
static MOVE_NUMBER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b\d+\.").expect("move number pattern is valid"));

/// One ply in standard algebraic notation, with optional check and
/// annotation suffixes.
static SAN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(?:O-O(?:-O)?|0-0(?:-0)?|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=?[QRBN])?)[+#]?[!?]{0,2}$",
  )
  .expect("SAN pattern is valid")
});

const RESULT_MARKERS: &[&str] = &["1-0", "0-1", "1/2-1/2", "*"];

// ─── Tags ────────────────────────────────────────────────────────────────────

fn unescape(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let mut chars = value.chars();
  while let Some(c) = chars.next() {
    if c == '\\'
      && let Some(next) = chars.next()
    {
      out.push(next);
    } else {
      out.push(c);
    }
  }
  out
}

/// Map every tag name to its first value in `blob`.
fn extract_tags(blob: &str) -> HashMap<String, String> {
  let mut tags = HashMap::new();
  for caps in TAG_PAIR.captures_iter(blob) {
    tags
      .entry(caps[1].to_string())
      .or_insert_with(|| unescape(&caps[2]));
  }
  tags
}

/// `YYYY.MM.DD` (or already `/`-separated). Placeholder dates such as
/// `????.??.??` yield `None`.
pub(crate) fn parse_pgn_date(value: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(&value.trim().replace('.', "/"), "%Y/%m/%d").ok()
}

/// `HH:MM:SS`.
pub(crate) fn parse_pgn_time(value: &str) -> Option<NaiveTime> {
  NaiveTime::parse_from_str(value.trim(), "%H:%M:%S").ok()
}

// ─── Movetext ────────────────────────────────────────────────────────────────

/// Every line that is not a tag-pair line.
fn movetext(blob: &str) -> String {
  blob
    .lines()
    .filter(|l| !l.trim_start().starts_with('['))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Drop `{...}` comments, `;` rest-of-line comments, and `(...)` variations.
fn strip_annotations(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut in_brace = false;
  let mut in_line_comment = false;
  let mut variation_depth = 0usize;

  for c in text.chars() {
    if in_brace {
      if c == '}' {
        in_brace = false;
        out.push(' ');
      }
      continue;
    }
    if in_line_comment {
      if c == '\n' {
        in_line_comment = false;
        out.push(' ');
      }
      continue;
    }
    match c {
      '{' => in_brace = true,
      ';' => in_line_comment = true,
      '(' => variation_depth += 1,
      ')' => {
        variation_depth = variation_depth.saturating_sub(1);
        out.push(' ');
      }
      _ if variation_depth > 0 => {}
      _ => out.push(c),
    }
  }
  out
}

/// `12.` / `12...` / `12.e4` → strip the number prefix.
fn strip_move_number(word: &str) -> &str {
  let digits = word.bytes().take_while(u8::is_ascii_digit).count();
  let rest = &word[digits..];
  if digits > 0 && rest.starts_with('.') {
    rest.trim_start_matches('.')
  } else {
    word
  }
}

/// Plies in order. Movetext without a single move number holds no moves,
/// and words that are not SAN are dropped.
fn tokenize_moves(text: &str) -> Vec<String> {
  let text = strip_annotations(text);
  if !MOVE_NUMBER.is_match(&text) {
    return Vec::new();
  }
  text
    .split_whitespace()
    .filter(|w| !RESULT_MARKERS.contains(w))
    .map(strip_move_number)
    .filter(|w| SAN.is_match(w))
    .map(str::to_string)
    .collect()
}

// ─── Entry point ─────────────────────────────────────────────────────────────

pub fn parse_blob(blob: &str) -> Result<ParsedPgn> {
  let mut tags = extract_tags(blob);
  let moves = tokenize_moves(&movetext(blob));

  if tags.is_empty() && moves.is_empty() {
    return Err(Error::Unparseable);
  }

  let mut take = |name: &str| tags.remove(name).filter(|v| !v.is_empty());

  Ok(ParsedPgn {
    event: take("Event"),
    site: take("Site"),
    date: take("Date").as_deref().and_then(parse_pgn_date),
    white: take("White"),
    black: take("Black"),
    result: take("Result"),
    current_position: take("CurrentPosition"),
    timezone: take("Timezone"),
    eco: take("ECO"),
    eco_url: take("ECOUrl"),
    start_time: take("StartTime").as_deref().and_then(parse_pgn_time),
    end_date: take("EndDate").as_deref().and_then(parse_pgn_date),
    end_time: take("EndTime").as_deref().and_then(parse_pgn_time),
    moves,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const LIVE_GAME: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[Date "2024.01.05"]
[Round "-"]
[White "Rhythmbear1"]
[Black "opponent42"]
[Result "1-0"]
[CurrentPosition "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq -"]
[Timezone "UTC"]
[ECO "C50"]
[ECOUrl "https://www.chess.com/openings/Italian-Game-2...Nf6"]
[UTCDate "2024.01.05"]
[UTCTime "10:00:00"]
[WhiteElo "1500"]
[BlackElo "1450"]
[TimeControl "180+2"]
[Termination "Rhythmbear1 won by checkmate"]
[StartTime "10:00:00"]
[EndDate "2024.01.05"]
[EndTime "10:01:30"]
[Link "https://www.chess.com/game/live/1"]

1. e4 {[%clk 0:03:01.9]} 1... e5 {[%clk 0:03:01.5]} 2. Bc4 {[%clk 0:03:02.6]} 2... Nc6 {[%clk 0:03:02.1]} 3. Qh5 {[%clk 0:03:03.2]} 3... Nf6 {[%clk 0:02:59.8]} 4. Qxf7# {[%clk 0:03:04.0]} 1-0
"#;

  // ── Tags ──────────────────────────────────────────────────────────────────

  #[test]
  fn extracts_known_tags() {
    let p = parse_blob(LIVE_GAME).unwrap();
    assert_eq!(p.event.as_deref(), Some("Live Chess"));
    assert_eq!(p.site.as_deref(), Some("Chess.com"));
    assert_eq!(p.white.as_deref(), Some("Rhythmbear1"));
    assert_eq!(p.black.as_deref(), Some("opponent42"));
    assert_eq!(p.result.as_deref(), Some("1-0"));
    assert_eq!(p.timezone.as_deref(), Some("UTC"));
    assert_eq!(p.eco.as_deref(), Some("C50"));
    assert_eq!(
      p.eco_url.as_deref(),
      Some("https://www.chess.com/openings/Italian-Game-2...Nf6")
    );
    assert!(p.current_position.as_deref().unwrap().starts_with("r1bqkb1r/"));
    assert_eq!(p.date, NaiveDate::from_ymd_opt(2024, 1, 5));
    assert_eq!(p.start_time, NaiveTime::from_hms_opt(10, 0, 0));
    assert_eq!(p.end_time, NaiveTime::from_hms_opt(10, 1, 30));
  }

  #[test]
  fn date_tag_is_not_confused_with_utc_date() {
    let blob = "[UTCDate \"2020.02.02\"]\n[Date \"2021.03.03\"]\n\n1. e4 *";
    let p = parse_blob(blob).unwrap();
    assert_eq!(p.date, NaiveDate::from_ymd_opt(2021, 3, 3));
  }

  #[test]
  fn first_occurrence_wins() {
    let blob = "[Event \"first\"]\n[Event \"second\"]\n";
    assert_eq!(parse_blob(blob).unwrap().event.as_deref(), Some("first"));
  }

  #[test]
  fn missing_tags_are_none() {
    let p = parse_blob("[Event \"Casual\"]\n\n1. d4 d5 *").unwrap();
    assert!(p.site.is_none());
    assert!(p.date.is_none());
    assert!(p.eco_url.is_none());
    assert!(p.start_time.is_none());
    assert!(p.end_date.is_none());
    assert_eq!(p.moves, vec!["d4", "d5"]);
  }

  #[test]
  fn placeholder_date_is_none() {
    let p = parse_blob("[Date \"????.??.??\"]\n[StartTime \"xx\"]").unwrap();
    assert!(p.date.is_none());
    assert!(p.start_time.is_none());
  }

  #[test]
  fn escaped_quotes_are_unescaped() {
    let p = parse_blob(r#"[Event "The \"Big\" One"]"#).unwrap();
    assert_eq!(p.event.as_deref(), Some(r#"The "Big" One"#));
  }

  // ── Movetext ──────────────────────────────────────────────────────────────

  #[test]
  fn clock_comments_and_numbers_are_dropped() {
    let p = parse_blob(LIVE_GAME).unwrap();
    assert_eq!(p.moves, vec!["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]);
  }

  #[test]
  fn plain_movetext_without_clocks() {
    let moves = tokenize_moves("1. e4 e5 2. Nf3 Nc6 3.Bb5 a6 1/2-1/2");
    assert_eq!(moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
  }

  #[test]
  fn variations_nags_and_line_comments_are_dropped() {
    let moves =
      tokenize_moves("1. e4 $1 (1. d4 d5 (1... Nf6)) 1... c5 ; Sicilian\n2. Nf3 0-1");
    assert_eq!(moves, vec!["e4", "c5", "Nf3"]);
  }

  #[test]
  fn castling_is_not_mistaken_for_a_number() {
    assert_eq!(tokenize_moves("5. O-O O-O-O"), vec!["O-O", "O-O-O"]);
  }

  // ── Failure ───────────────────────────────────────────────────────────────

  #[test]
  fn garbage_is_unparseable() {
    assert!(matches!(parse_blob(""), Err(Error::Unparseable)));
    assert!(matches!(parse_blob("  \n {just a comment} *"), Err(Error::Unparseable)));
  }

  #[test]
  fn prose_is_unparseable() {
    for blob in ["hello world", "e4 e5 Nf3 Nc6", "1. hello world 2. again"] {
      assert!(
        matches!(parse_blob(blob), Err(Error::Unparseable)),
        "{blob:?} should be rejected"
      );
    }
  }

  #[test]
  fn stray_words_between_moves_are_dropped() {
    assert_eq!(
      tokenize_moves("1. e4 resigns e5 2. exd5?! Qxd5+ 3. e8=Q#"),
      vec!["e4", "e5", "exd5?!", "Qxd5+", "e8=Q#"]
    );
  }

  #[test]
  fn tags_without_moves_still_parse() {
    let p = parse_blob("[Event \"Casual\"]\n\nno moves here").unwrap();
    assert_eq!(p.event.as_deref(), Some("Casual"));
    assert!(p.moves.is_empty());
  }
}
