//! Key tuples and matching rules shared by every identity store.
//!
//! All text comparisons are case-insensitive exact matches over Unicode
//! lowercase forms. The SQLite store registers [`cmp_folded`] as a collation,
//! so the staging tables and the persistent store agree on which keys are
//! equal.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::model::{
  Description, Headword, Issue, Keyword, Location, Mine, NO_OLD_CODE,
};

/// Order two strings by their lowercase forms, character by character.
pub fn cmp_folded(a: &str, b: &str) -> Ordering {
  a.chars()
    .flat_map(char::to_lowercase)
    .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Case-insensitive equality: `ÉÉN` and `één` are the same key.
pub fn same(a: &str, b: &str) -> bool { cmp_folded(a, b).is_eq() }

// ─── Resolver configuration ──────────────────────────────────────────────────

/// Which fields make up a keyword's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMatch {
  /// The word alone; a supplied note is stored but not compared.
  Word,
  /// The word and the note, an empty note included.
  WordAndNote,
  /// The word alone when the note is empty, otherwise word and note.
  #[default]
  NoteWhenPresent,
}

/// Policy knobs fixed for the lifetime of one identity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
  #[serde(default)]
  pub keyword_match:  KeywordMatch,
  /// Resolve an entry equal to an existing one to that entry's identity.
  /// Off by default: every accepted line creates a new entry.
  #[serde(default)]
  pub dedupe_entries: bool,
}

// ─── Headword ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadwordKey {
  pub gloss: String,
}

impl HeadwordKey {
  pub fn new(gloss: impl Into<String>) -> Self { Self { gloss: gloss.into() } }

  pub fn matches(&self, h: &Headword) -> bool { same(&self.gloss, &h.gloss) }

  pub fn into_record(self) -> Headword { Headword { gloss: self.gloss } }
}

// ─── Description ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionKey {
  pub source_list: String,
  pub book:        String,
  pub note:        String,
}

impl DescriptionKey {
  pub fn matches(&self, d: &Description) -> bool {
    same(&self.source_list, &d.source_list)
      && same(&self.book, &d.book)
      && same(&self.note, &d.note)
  }

  pub fn into_record(self) -> Description {
    Description {
      source_list: self.source_list,
      book:        self.book,
      note:        self.note,
    }
  }
}

// ─── Location ────────────────────────────────────────────────────────────────

/// Locations are identified by city and new code. The old code is only used
/// when a new record has to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationKey {
  pub city:     String,
  pub new_code: String,
  pub old_code: Option<String>,
}

impl LocationKey {
  pub fn matches(&self, l: &Location) -> bool {
    same(&self.city, &l.city) && same(&self.new_code, &l.new_code)
  }

  pub fn into_record(self) -> Location {
    Location {
      city:     self.city,
      old_code: self
        .old_code
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| NO_OLD_CODE.to_owned()),
      new_code: self.new_code,
      note:     String::new(),
      visible:  true,
    }
  }
}

// ─── Keyword ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordKey {
  pub word: String,
  pub note: String,
}

impl KeywordKey {
  /// The note that takes part in matching under `policy`, if any.
  pub fn compared_note(&self, policy: KeywordMatch) -> Option<&str> {
    match policy {
      KeywordMatch::Word => None,
      KeywordMatch::WordAndNote => Some(&self.note),
      KeywordMatch::NoteWhenPresent if self.note.is_empty() => None,
      KeywordMatch::NoteWhenPresent => Some(&self.note),
    }
  }

  pub fn matches(&self, k: &Keyword, policy: KeywordMatch) -> bool {
    same(&self.word, &k.word)
      && self
        .compared_note(policy)
        .is_none_or(|note| same(note, &k.note))
  }

  pub fn into_record(self) -> Keyword {
    Keyword { word: self.word, note: self.note, visible: true }
  }
}

// ─── Mine ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MineKey {
  pub name: String,
}

impl MineKey {
  pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }

  pub fn matches(&self, m: &Mine) -> bool { same(&self.name, &m.name) }

  pub fn into_record(self) -> Mine { Mine::named(self.name) }
}

// ─── Issue ───────────────────────────────────────────────────────────────────

/// Publication coordinates. A key without a section matches an issue with
/// any section.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IssueKey {
  pub part:    u32,
  pub section: Option<u32>,
  pub number:  u32,
}

impl IssueKey {
  pub fn new(part: u32, section: Option<u32>, number: u32) -> Self {
    Self { part, section, number }
  }

  pub fn matches(&self, issue: &Issue) -> bool {
    self.part == issue.part
      && self.number == issue.number
      && self.section.is_none_or(|s| issue.section == Some(s))
  }

  /// The file stem shared by a file's fixture and skip outputs,
  /// e.g. `fixture-d3-s1-a2`.
  pub fn file_stem(&self) -> String {
    match self.section {
      Some(s) => format!("fixture-d{}-s{s}-a{}", self.part, self.number),
      None => format!("fixture-d{}-a{}", self.part, self.number),
    }
  }
}

impl fmt::Display for IssueKey {
  /// `part/section/number`, with an empty middle when there is no section.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.section {
      Some(s) => write!(f, "{}/{s}/{}", self.part, self.number),
      None => write!(f, "{}//{}", self.part, self.number),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn keyword(word: &str, note: &str) -> Keyword {
    Keyword { word: word.into(), note: note.into(), visible: true }
  }

  #[test]
  fn headword_match_folds_case() {
    let key = HeadwordKey::new("Boterham");
    assert!(key.matches(&Headword { gloss: "boterham".into() }));
    assert!(!key.matches(&Headword { gloss: "boterhammen".into() }));
  }

  #[test]
  fn folding_covers_accented_letters() {
    assert!(same("ÉÉN", "één"));
    assert!(same("Ölmühle", "ölMÜHLE"));
    assert!(!same("een", "één"));
    assert_eq!(cmp_folded("Äpfel", "äpfel"), Ordering::Equal);
    assert_eq!(cmp_folded("a", "B"), Ordering::Less);
  }

  #[test]
  fn keyword_note_when_present() {
    let bare = KeywordKey { word: "brood".into(), note: String::new() };
    let noted = KeywordKey { word: "brood".into(), note: "rogge".into() };
    let stored = keyword("Brood", "tarwe");

    assert!(bare.matches(&stored, KeywordMatch::NoteWhenPresent));
    assert!(!noted.matches(&stored, KeywordMatch::NoteWhenPresent));
    assert!(noted.matches(&keyword("brood", "Rogge"), KeywordMatch::NoteWhenPresent));
  }

  #[test]
  fn keyword_word_only_ignores_notes() {
    let noted = KeywordKey { word: "brood".into(), note: "rogge".into() };
    assert!(noted.matches(&keyword("brood", "tarwe"), KeywordMatch::Word));
  }

  #[test]
  fn keyword_word_and_note_compares_empty_note() {
    let bare = KeywordKey { word: "brood".into(), note: String::new() };
    assert!(!bare.matches(&keyword("brood", "tarwe"), KeywordMatch::WordAndNote));
    assert!(bare.matches(&keyword("brood", ""), KeywordMatch::WordAndNote));
  }

  #[test]
  fn location_ignores_old_code_when_matching() {
    let key = LocationKey {
      city:     "Heerlen".into(),
      new_code: "Q095p".into(),
      old_code: Some("Q95".into()),
    };
    let stored = LocationKey {
      city:     "HEERLEN".into(),
      new_code: "q095p".into(),
      old_code: None,
    }
    .into_record();
    assert_eq!(stored.old_code, NO_OLD_CODE);
    assert!(key.matches(&stored));
  }

  #[test]
  fn issue_key_without_section_matches_any_section() {
    let issue = Issue {
      part:              3,
      section:           Some(1),
      number:            2,
      title:             String::new(),
      year:              1990,
      authors:           String::new(),
      publication_place: String::new(),
      visible:           true,
    };
    assert!(IssueKey::new(3, None, 2).matches(&issue));
    assert!(IssueKey::new(3, Some(1), 2).matches(&issue));
    assert!(!IssueKey::new(3, Some(2), 2).matches(&issue));
  }

  #[test]
  fn issue_key_display_and_stem() {
    assert_eq!(IssueKey::new(2, None, 5).to_string(), "2//5");
    assert_eq!(IssueKey::new(3, Some(1), 2).to_string(), "3/1/2");
    assert_eq!(IssueKey::new(2, None, 5).file_stem(), "fixture-d2-a5");
    assert_eq!(IssueKey::new(3, Some(1), 2).file_stem(), "fixture-d3-s1-a2");
  }
}
