//! Structural line validation, run before any resolution.

use crate::schema::{Line, NULL};

/// The fields every accepted line must carry, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RequiredField {
  Headword     = 1,
  Keyword      = 2,
  DialectWord  = 3,
  City         = 4,
  LocationCode = 5,
}

impl RequiredField {
  pub const ALL: [Self; 5] = [
    Self::Headword,
    Self::Keyword,
    Self::DialectWord,
    Self::City,
    Self::LocationCode,
  ];

  /// Position in [`Self::ALL`], starting at 1.
  pub fn index(self) -> u8 { self as u8 }

  pub fn name(self) -> &'static str {
    match self {
      Self::Headword => "headword",
      Self::Keyword => "keyword",
      Self::DialectWord => "dialect word",
      Self::City => "location city",
      Self::LocationCode => "location code",
    }
  }

  fn value(self, line: &Line) -> &str {
    match self {
      Self::Headword => &line.headword_gloss,
      Self::Keyword => &line.keyword_word,
      Self::DialectWord => &line.dialect_word,
      Self::City => &line.location_city,
      Self::LocationCode => &line.location_new_code,
    }
  }
}

/// Whether `value` is empty or one of the placeholders the exports use for
/// "no value": `NULL`, `?`, `-`, a `#` comment, or a bare number.
pub fn is_placeholder(value: &str) -> bool {
  value.is_empty()
    || value == NULL
    || value == "?"
    || value == "-"
    || value.starts_with('#')
    || value.chars().all(char::is_numeric)
}

/// The first required field holding a placeholder, if any.
pub fn first_invalid(line: &Line) -> Option<RequiredField> {
  RequiredField::ALL
    .into_iter()
    .find(|field| is_placeholder(field.value(line)))
}

/// `0` when `line` is acceptable, otherwise the [`RequiredField::index`] of
/// the first failing field.
pub fn check(line: &Line) -> u8 {
  first_invalid(line).map_or(0, RequiredField::index)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::{Record, SchemaVersion};

  fn revised(cols: &str) -> Line {
    let cols: Vec<&str> = cols.split('\t').collect();
    Record::from_columns(SchemaVersion::Revised, &cols).normalize()
  }

  fn good() -> Line { revised("kaas\t\tN12\tkaas\t\tkees\t\t\tQ095p\tHeerlen\t") }

  #[test]
  fn complete_line_is_accepted() {
    assert_eq!(check(&good()), 0);
  }

  #[test]
  fn null_keyword_fails_on_keyword() {
    let line = revised("kaas\t\tN12\tNULL\t\tkees\t\t\tQ095p\tHeerlen\t");
    assert_eq!(first_invalid(&line), Some(RequiredField::Keyword));
    assert_eq!(check(&line), 2);
  }

  #[test]
  fn placeholders_are_rejected() {
    for bad in ["", "NULL", "?", "-", "#kaas", "123", "٣"] {
      assert!(is_placeholder(bad), "{bad:?}");
    }
    for ok in ["kaas", "a1", "Q095p", "1e", "- kaas"] {
      assert!(!is_placeholder(ok), "{ok:?}");
    }
  }

  #[test]
  fn first_failing_field_wins() {
    let mut line = good();
    line.location_city = "?".into();
    line.location_new_code = "-".into();
    assert_eq!(check(&line), RequiredField::City.index());
  }

  #[test]
  fn every_result_is_zero_or_a_checked_index() {
    let values = ["", "x", "1", "#", "NULL"];
    for h in values {
      for k in values {
        for c in values {
          let mut line = good();
          line.headword_gloss = h.into();
          line.keyword_word = k.into();
          line.location_new_code = c.into();
          let r = check(&line);
          assert!(r == 0 || RequiredField::ALL.iter().any(|f| f.index() == r));
        }
      }
    }
  }
}
