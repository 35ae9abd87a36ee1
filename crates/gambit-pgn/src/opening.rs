//! Opening names derived from the canonical opening URL slug.
//!
//! `https://www.chess.com/openings/Sicilian-Defense-Closed-Variation`
//! classifies as name `Sicilian Defense Closed Variation`, family
//! `Sicilian Defense`, variation `Closed Variation`.

/// Words that end an opening family name.
const FAMILY_NOUNS: &[&str] = &[
  "opening",
  "defense",
  "defence",
  "game",
  "gambit",
  "attack",
  "system",
  "countergambit",
  "counterattack",
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opening {
  pub name:      String,
  pub family:    String,
  pub variation: String,
}

/// The last path segment of a URL, or the input itself for a bare slug.
fn slug_of(url_or_slug: &str) -> &str {
  let without_query = url_or_slug.trim().split(['?', '#']).next().unwrap_or("");
  let trimmed = without_query.trim_end_matches('/');
  trimmed.rsplit('/').next().unwrap_or(trimmed)
}

fn is_malformed(slug: &str) -> bool {
  slug.is_empty()
    || slug.chars().any(char::is_whitespace)
    || !slug.chars().any(char::is_alphanumeric)
}

/// A word that opens a variation qualifier rather than continuing the
/// family name.
fn is_qualifier(word: &str) -> bool {
  word.eq_ignore_ascii_case("variation")
    || word.eq_ignore_ascii_case("line")
    || word.starts_with(|c: char| c.is_ascii_digit())
}

/// Classify an opening URL or slug. Total: malformed input comes back as
/// the name with empty family and variation.
pub fn classify_opening(url_or_slug: &str) -> Opening {
  let slug = slug_of(url_or_slug);
  if is_malformed(slug) {
    return Opening {
      name: slug.to_string(),
      ..Opening::default()
    };
  }

  let words: Vec<&str> = slug.split('-').filter(|w| !w.is_empty()).collect();

  let family_len = words
    .iter()
    .position(|w| FAMILY_NOUNS.iter().any(|n| w.eq_ignore_ascii_case(n)))
    .map(|i| i + 1)
    .or_else(|| {
      words
        .iter()
        .position(|w| is_qualifier(w))
        .filter(|&i| i > 0)
    })
    .unwrap_or(words.len());

  Opening {
    name:      words.join(" "),
    family:    words[..family_len].join(" "),
    variation: words[family_len..].join(" "),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn check(input: &str, name: &str, family: &str, variation: &str) {
    let o = classify_opening(input);
    assert_eq!(o.name, name, "name of {input}");
    assert_eq!(o.family, family, "family of {input}");
    assert_eq!(o.variation, variation, "variation of {input}");
  }

  #[test]
  fn splits_after_family_noun() {
    check(
      "Italian-Game-Classical-Variation",
      "Italian Game Classical Variation",
      "Italian Game",
      "Classical Variation",
    );
    check(
      "https://www.chess.com/openings/Queens-Pawn-Opening-Accelerated-London-System",
      "Queens Pawn Opening Accelerated London System",
      "Queens Pawn Opening",
      "Accelerated London System",
    );
    check(
      "Ruy-Lopez-Opening-Morphy-Defense",
      "Ruy Lopez Opening Morphy Defense",
      "Ruy Lopez Opening",
      "Morphy Defense",
    );
  }

  #[test]
  fn numeric_qualifiers_stay_in_variation() {
    check(
      "https://www.chess.com/openings/Caro-Kann-Defense-Advance-Variation-3...c5",
      "Caro Kann Defense Advance Variation 3...c5",
      "Caro Kann Defense",
      "Advance Variation 3...c5",
    );
  }

  #[test]
  fn without_family_noun_splits_before_qualifier() {
    check("Old-Benoni-3.d5", "Old Benoni 3.d5", "Old Benoni", "3.d5");
  }

  #[test]
  fn family_only_has_empty_variation() {
    check("Polish-Opening", "Polish Opening", "Polish Opening", "");
    check("Bongcloud", "Bongcloud", "Bongcloud", "");
  }

  #[test]
  fn trailing_slash_and_query_are_ignored() {
    check(
      "https://www.chess.com/openings/Scotch-Game/?ref=1",
      "Scotch Game",
      "Scotch Game",
      "",
    );
  }

  #[test]
  fn malformed_slug_degrades_to_name_only() {
    check("", "", "", "");
    check("---", "---", "", "");
  }
}
