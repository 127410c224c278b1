//! Record types: the entities produced by an import run.
//!
//! Headwords, descriptions, locations, keywords and mines are created lazily,
//! at most once per distinct key, and never deleted by the importer. Entries
//! and their mine links are created once per accepted input line and never
//! updated.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

use crate::key::same;

/// Placeholder stored in a location's old code when the source has none.
pub const NO_OLD_CODE: &str = "-";

/// Placeholder for descriptive text fields that have no source value.
pub const UNKNOWN: &str = "(unknown)";

// ─── Identity ────────────────────────────────────────────────────────────────

/// A positive integer identity, assigned either by durable storage or by a
/// staging table.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Pk(pub i64);

impl Pk {
  pub fn get(self) -> i64 { self.0 }

  /// The identity that follows this one.
  pub fn next(self) -> Self { Self(self.0 + 1) }
}

impl fmt::Display for Pk {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Model names ─────────────────────────────────────────────────────────────

/// The dotted entity-type name written into every fixture record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter,
)]
pub enum Model {
  #[strum(serialize = "dictionary.headword")]
  Headword,
  #[strum(serialize = "dictionary.description")]
  Description,
  #[strum(serialize = "dictionary.headworddescription")]
  HeadwordDescription,
  #[strum(serialize = "dictionary.location")]
  Location,
  #[strum(serialize = "dictionary.keyword")]
  Keyword,
  #[strum(serialize = "dictionary.issue")]
  Issue,
  #[strum(serialize = "dictionary.entry")]
  Entry,
  #[strum(serialize = "dictionary.mine")]
  Mine,
  #[strum(serialize = "dictionary.entrymine")]
  EntryMine,
}

// ─── Lexical records ─────────────────────────────────────────────────────────

/// A dictionary lemma in its display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headword {
  pub gloss: String,
}

/// Bibliographic description, nominally shared by every entry of a headword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
  pub source_list: String,
  pub book:        String,
  pub note:        String,
}

/// Explicit join row between a headword and one of its descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadwordDescription {
  pub headword:    Pk,
  pub description: Pk,
}

/// A cross-reference term grouping related entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
  pub word:    String,
  pub note:    String,
  pub visible: bool,
}

// ─── Places ──────────────────────────────────────────────────────────────────

/// A surveyed place, identified by its (new) Kloeke code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub city:     String,
  pub old_code: String,
  pub new_code: String,
  pub note:     String,
  pub visible:  bool,
}

/// A workplace annotation attached to entries of one publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mine {
  pub name:     String,
  pub location: String,
  pub note:     String,
}

impl Mine {
  /// A mine known only by name; descriptive fields take their placeholders.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name:     name.into(),
      location: UNKNOWN.to_owned(),
      note:     String::new(),
    }
  }
}

// ─── Publication ─────────────────────────────────────────────────────────────

/// One published installment. Issues are registered administratively and are
/// never created by an import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
  pub part:              u32,
  pub section:           Option<u32>,
  pub number:            u32,
  pub title:             String,
  pub year:              i32,
  pub authors:           String,
  pub publication_place: String,
  pub visible:           bool,
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One recorded dialect-word variant and everything it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
  pub dialect_word:  String,
  pub note:          String,
  /// Remark that only holds for this entry's location.
  pub location_note: String,
  pub headword:      Pk,
  pub description:   Pk,
  pub location:      Pk,
  pub keyword:       Pk,
  pub issue:         Pk,
}

impl Entry {
  /// Field-wise equality as used by the optional entry deduplication:
  /// references compare exactly, text compares case-insensitively.
  pub fn same_as(&self, other: &Entry) -> bool {
    self.headword == other.headword
      && self.description == other.description
      && self.location == other.location
      && self.keyword == other.keyword
      && self.issue == other.issue
      && same(&self.dialect_word, &other.dialect_word)
      && same(&self.note, &other.note)
      && same(&self.location_note, &other.location_note)
  }
}

/// Explicit join row between an entry and a mine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMine {
  pub entry: Pk,
  pub mine:  Pk,
}
