//! Streaming writers for the fixture document and the skip log.

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
};

use serde::Serialize;
use wld_core::model::{Model, Pk};

use crate::Result;

// ─── Fixture ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct FixtureRecord<'a, T> {
  model:  &'a str,
  pk:     Pk,
  fields: &'a T,
}

/// Writes a JSON array of `{"model", "pk", "fields"}` objects one record at a
/// time. The closing `]` is only written by [`FixtureWriter::finish`]; a
/// writer dropped early leaves an unterminated document behind.
pub struct FixtureWriter<W: Write> {
  out:     W,
  records: u64,
}

impl FixtureWriter<BufWriter<File>> {
  /// Create (or truncate) the fixture file at `path`.
  pub fn create(path: &Path) -> Result<Self> {
    Self::new(BufWriter::new(File::create(path)?))
  }
}

impl<W: Write> FixtureWriter<W> {
  pub fn new(mut out: W) -> Result<Self> {
    out.write_all(b"[")?;
    Ok(Self { out, records: 0 })
  }

  /// Append one record, serialising `fields` as its `fields` object.
  pub fn append<T: Serialize>(&mut self, model: Model, pk: Pk, fields: &T) -> Result<()> {
    if self.records > 0 {
      self.out.write_all(b",")?;
    }
    let record = FixtureRecord { model: model.as_ref(), pk, fields };
    serde_json::to_writer_pretty(&mut self.out, &record)?;
    self.records += 1;
    Ok(())
  }

  pub fn records(&self) -> u64 { self.records }

  /// Close the array, flush, and hand back the sink.
  pub fn finish(mut self) -> Result<W> {
    self.out.write_all(b"]")?;
    self.out.flush()?;
    Ok(self.out)
  }
}

// ─── Skip log ────────────────────────────────────────────────────────────────

/// One rejected raw line per record, newline-terminated.
pub struct SkipWriter<W: Write> {
  out:   W,
  lines: u64,
}

impl SkipWriter<BufWriter<File>> {
  /// Create (or truncate) the skip log at `path`.
  pub fn create(path: &Path) -> Result<Self> {
    Ok(Self::new(BufWriter::new(File::create(path)?)))
  }
}

impl<W: Write> SkipWriter<W> {
  pub fn new(out: W) -> Self { Self { out, lines: 0 } }

  pub fn write_line(&mut self, raw: &str) -> Result<()> {
    writeln!(self.out, "{raw}")?;
    self.lines += 1;
    Ok(())
  }

  pub fn lines(&self) -> u64 { self.lines }

  pub fn finish(mut self) -> Result<W> {
    self.out.flush()?;
    Ok(self.out)
  }
}
