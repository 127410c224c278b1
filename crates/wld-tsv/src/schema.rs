//! Column layouts and the normalised field bundle.
//!
//! Pipeline per data line:
//!   raw &str
//!     └─ split on '\t'                 → Vec<&str>
//!          └─ Record::from_columns()   → Legacy | Revised (positional)
//!               └─ Record::normalize() → Line (semantic, cleaned)
//!                    └─ MineRule::apply() when the file carries mines

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use wld_core::{
  key::{DescriptionKey, HeadwordKey, KeywordKey, LocationKey},
  store::GroupKeys,
};

use crate::error::{Error, Result};

/// Literal placeholder used by the source exports for "no value".
pub const NULL: &str = "NULL";

// ─── Schema version ──────────────────────────────────────────────────────────

/// The two known column layouts, told apart by the header's first column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
  /// 16 columns, header starts with `Lemmanummer`.
  Legacy,
  /// 11 columns, header starts with `lemma.name`.
  Revised,
}

impl SchemaVersion {
  pub const LEGACY_TAG: &str = "Lemmanummer";
  pub const REVISED_TAG: &str = "lemma.name";

  /// Detect the layout from the first column of the header line.
  pub fn detect(first_column: &str) -> Result<Self> {
    match first_column.trim() {
      Self::LEGACY_TAG => Ok(Self::Legacy),
      Self::REVISED_TAG => Ok(Self::Revised),
      other => Err(Error::UnknownSchema(other.to_owned())),
    }
  }

  pub fn tag(self) -> &'static str {
    match self {
      Self::Legacy => Self::LEGACY_TAG,
      Self::Revised => Self::REVISED_TAG,
    }
  }

  pub fn columns(self) -> usize {
    match self {
      Self::Legacy => 16,
      Self::Revised => 11,
    }
  }
}

// ─── Positional records ──────────────────────────────────────────────────────

/// The 16-column legacy export. Columns the importer does not use are kept so
/// the layout stays documented in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyRecord {
  pub headword_number:  String, //  0 Lemmanummer
  pub headword_title:   String, //  1 Lemmatitel
  pub question:         String, //  2 Vraag(tekst)
  pub keyword:          String, //  3 Trefwoord
  pub lexical_variant:  String, //  4 Lexicale variant
  pub phonetic_variant: String, //  5 Fonetische variant
  pub questionnaire:    String, //  6 Vragenlijst
  pub question_number:  String, //  7 Vraagnummer
  pub book:             String, //  8 Boek
  pub book_page:        String, //  9 Boekpagina
  pub place_name:       String, // 10 Plaatsnaam
  pub region:           String, // 11 Regio
  pub subregion:        String, // 12 Subregio
  pub informant_code:   String, // 13 Informantencode
  pub comment:          String, // 14 Commentaar
  pub kloeke_code:      String, // 15 Plaatscode (Kloeke)
}

/// The 11-column revised export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisedRecord {
  pub headword:      String, //  0 lemma.name
  pub headword_note: String, //  1 lemma.toelichting
  pub source_list:   String, //  2 lemma.bronnenlijst
  pub keyword:       String, //  3 trefwoord.name
  pub keyword_note:  String, //  4 trefwoord.toelichting
  pub dialect_word:  String, //  5 dialectopgave.name
  pub entry_note:    String, //  6 dialectopgave.toelichting
  pub old_code:      String, //  7 dialect.kloeke (old)
  pub new_code:      String, //  8 dialect.nieuw
  pub city:          String, //  9 dialect.stad
  pub location_note: String, // 10 dialectopgave.kloeketoelichting
}

/// A data line decoded by position, tagged with its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
  Legacy(LegacyRecord),
  Revised(RevisedRecord),
}

fn col(cols: &[&str], i: usize) -> String {
  cols.get(i).map(|c| (*c).to_owned()).unwrap_or_default()
}

impl Record {
  /// Decode `cols` positionally. Missing trailing columns become empty.
  pub fn from_columns(version: SchemaVersion, cols: &[&str]) -> Self {
    match version {
      SchemaVersion::Legacy => Self::Legacy(LegacyRecord {
        headword_number:  col(cols, 0),
        headword_title:   col(cols, 1),
        question:         col(cols, 2),
        keyword:          col(cols, 3),
        lexical_variant:  col(cols, 4),
        phonetic_variant: col(cols, 5),
        questionnaire:    col(cols, 6),
        question_number:  col(cols, 7),
        book:             col(cols, 8),
        book_page:        col(cols, 9),
        place_name:       col(cols, 10),
        region:           col(cols, 11),
        subregion:        col(cols, 12),
        informant_code:   col(cols, 13),
        comment:          col(cols, 14),
        kloeke_code:      col(cols, 15),
      }),
      SchemaVersion::Revised => Self::Revised(RevisedRecord {
        headword:      col(cols, 0),
        headword_note: col(cols, 1),
        source_list:   col(cols, 2),
        keyword:       col(cols, 3),
        keyword_note:  col(cols, 4),
        dialect_word:  col(cols, 5),
        entry_note:    col(cols, 6),
        old_code:      col(cols, 7),
        new_code:      col(cols, 8),
        city:          col(cols, 9),
        location_note: col(cols, 10),
      }),
    }
  }

  pub fn version(&self) -> SchemaVersion {
    match self {
      Self::Legacy(_) => SchemaVersion::Legacy,
      Self::Revised(_) => SchemaVersion::Revised,
    }
  }

  /// Map positional columns to semantic fields and clean every value.
  pub fn normalize(self) -> Line {
    let version = self.version();
    let line = match self {
      // The legacy export's question-number column carries the book
      // reference; the "Boek" column itself is not used.
      Self::Legacy(r) => Line {
        version,
        headword_gloss: r.headword_title,
        description_source_list: r.questionnaire,
        description_book: r.question_number,
        description_note: r.question,
        location_city: r.place_name,
        location_new_code: r.kloeke_code,
        location_old_code: None,
        keyword_word: r.keyword,
        keyword_note: String::new(),
        dialect_word: r.phonetic_variant,
        entry_note: r.comment.clone(),
        entry_location_note: String::new(),
        mine_annotation: r.comment,
        mines: Vec::new(),
      },
      Self::Revised(r) => Line {
        version,
        headword_gloss: r.headword,
        description_source_list: r.source_list,
        description_book: String::new(),
        description_note: r.headword_note,
        location_city: r.city,
        location_new_code: r.new_code,
        location_old_code: Some(r.old_code),
        keyword_word: r.keyword,
        keyword_note: r.keyword_note,
        dialect_word: r.dialect_word,
        entry_note: r.entry_note,
        entry_location_note: r.location_note.clone(),
        mine_annotation: r.location_note,
        mines: Vec::new(),
      },
    };
    line.cleaned()
  }
}

// ─── Field bundle ────────────────────────────────────────────────────────────

/// One data line by semantic field name, independent of column position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
  pub version:                 SchemaVersion,
  pub headword_gloss:          String,
  pub description_source_list: String,
  pub description_book:        String,
  pub description_note:        String,
  pub location_city:           String,
  pub location_new_code:       String,
  /// Only the revised layout carries the old Kloeke code.
  pub location_old_code:       Option<String>,
  pub keyword_word:            String,
  pub keyword_note:            String,
  pub dialect_word:            String,
  pub entry_note:              String,
  pub entry_location_note:     String,
  /// Free text the mine list is extracted from: the per-location note in the
  /// revised layout, the comment column in the legacy one.
  pub mine_annotation:         String,
  /// Filled by [`crate::mines::MineRule::apply`]; empty otherwise.
  pub mines:                   Vec<String>,
}

/// Strip wrapping quotes and whitespace, and map the `NULL` placeholder to
/// the empty string.
pub fn clean(value: &str) -> String {
  let mut v = value.trim_matches('"').trim();
  if v.starts_with('\'') && v.ends_with('\'') {
    v = v.trim_matches('\'');
  }
  if v == NULL { String::new() } else { v.to_owned() }
}

/// Decode HTML character references one at a time. A bare `&` or an
/// unknown entity is left in place; the references around it still decode.
fn decode_entities(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let mut rest = value;
  while let Some(start) = rest.find('&') {
    out.push_str(&rest[..start]);
    let tail = &rest[start..];
    // A reference runs to the first `;`, unless another `&` comes first.
    match tail[1..].find(['&', ';']) {
      Some(i) if tail.as_bytes()[i + 1] == b';' => {
        let reference = &tail[..i + 2];
        match unescape_with(reference, resolve_html5_entity) {
          Ok(decoded) => out.push_str(&decoded),
          Err(_) => out.push_str(reference),
        }
        rest = &tail[i + 2..];
      }
      _ => {
        out.push('&');
        rest = &tail[1..];
      }
    }
  }
  out.push_str(rest);
  out
}

impl Line {
  fn cleaned(mut self) -> Self {
    self.dialect_word = decode_entities(&self.dialect_word);
    self.keyword_word = decode_entities(&self.keyword_word);

    for field in [
      &mut self.headword_gloss,
      &mut self.description_source_list,
      &mut self.description_book,
      &mut self.description_note,
      &mut self.location_city,
      &mut self.location_new_code,
      &mut self.keyword_word,
      &mut self.keyword_note,
      &mut self.dialect_word,
      &mut self.entry_note,
      &mut self.entry_location_note,
      &mut self.mine_annotation,
    ] {
      *field = clean(field);
    }
    self.location_old_code = self
      .location_old_code
      .map(|c| clean(&c))
      .filter(|c| !c.is_empty());
    self
  }

  /// The keys resolved together as one record group.
  pub fn group_keys(&self) -> GroupKeys {
    GroupKeys {
      headword:    HeadwordKey::new(&self.headword_gloss),
      description: DescriptionKey {
        source_list: self.description_source_list.clone(),
        book:        self.description_book.clone(),
        note:        self.description_note.clone(),
      },
      location:    LocationKey {
        city:     self.location_city.clone(),
        new_code: self.location_new_code.clone(),
        old_code: self.location_old_code.clone(),
      },
      keyword:     KeywordKey {
        word: self.keyword_word.clone(),
        note: self.keyword_note.clone(),
      },
    }
  }
}
