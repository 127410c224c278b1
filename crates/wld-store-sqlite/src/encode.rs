//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, counters as signed integers,
//! booleans as 0/1 and the run method as its lowercase name.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use wld_core::{
  catalog::SourceFile,
  key::IssueKey,
  model::{Issue, Location, Mine, Pk},
  status::{Method, RunStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counters ────────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `source_files` row.
pub struct RawSourceFile {
  pub id:        i64,
  pub part:      u32,
  pub section:   Option<u32>,
  pub number:    u32,
  pub path:      String,
  pub processed: Option<String>,
  pub read:      i64,
  pub skipped:   i64,
}

pub const SOURCE_FILE_COLUMNS: &str =
  "id, part, section, number, path, processed, read, skipped";

impl RawSourceFile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      part:      row.get(1)?,
      section:   row.get(2)?,
      number:    row.get(3)?,
      path:      row.get(4)?,
      processed: row.get(5)?,
      read:      row.get(6)?,
      skipped:   row.get(7)?,
    })
  }

  pub fn into_source_file(self) -> Result<SourceFile> {
    Ok(SourceFile {
      id:        Pk(self.id),
      key:       IssueKey::new(self.part, self.section, self.number),
      path:      PathBuf::from(self.path),
      processed: self.processed.as_deref().map(decode_dt).transpose()?,
      read:      decode_count(self.read),
      skipped:   decode_count(self.skipped),
    })
  }
}

/// Raw values read from a `run_status` row.
pub struct RawStatus {
  pub id:      i64,
  pub read:    i64,
  pub skipped: i64,
  pub status:  String,
  pub method:  String,
}

impl RawStatus {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:      row.get(0)?,
      read:    row.get(1)?,
      skipped: row.get(2)?,
      status:  row.get(3)?,
      method:  row.get(4)?,
    })
  }

  pub fn into_status(self) -> Result<RunStatus> {
    Ok(RunStatus {
      id:      Pk(self.id),
      read:    decode_count(self.read),
      skipped: decode_count(self.skipped),
      status:  self.status,
      method:  self.method.parse::<Method>()?,
    })
  }
}

// ─── Snapshot rows ───────────────────────────────────────────────────────────

pub fn location_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Pk, Location)> {
  Ok((Pk(row.get(0)?), Location {
    city:     row.get(1)?,
    old_code: row.get(2)?,
    new_code: row.get(3)?,
    note:     row.get(4)?,
    visible:  row.get(5)?,
  }))
}

pub fn issue_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Pk, Issue)> {
  Ok((Pk(row.get(0)?), Issue {
    part:              row.get(1)?,
    section:           row.get(2)?,
    number:            row.get(3)?,
    title:             row.get(4)?,
    year:              row.get(5)?,
    authors:           row.get(6)?,
    publication_place: row.get(7)?,
    visible:           row.get(8)?,
  }))
}

pub fn mine_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Pk, Mine)> {
  Ok((Pk(row.get(0)?), Mine {
    name:     row.get(1)?,
    location: row.get(2)?,
    note:     row.get(3)?,
  }))
}
