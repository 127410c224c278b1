//! Streaming reader over one tab-separated survey file.

use std::io::BufRead;

use tracing::{debug, warn};

use crate::{
  error::{Error, Result},
  mines::MineRule,
  schema::{Line, Record, SchemaVersion},
};

const BOM: char = '\u{feff}';

/// One data line: its 1-based position in the file, the raw text as read
/// (for the skip log), and the decoded bundle.
#[derive(Debug, Clone)]
pub struct SourceLine {
  pub number: usize,
  pub raw:    String,
  pub line:   Line,
}

/// Reads the header once to fix the layout, then yields one [`SourceLine`]
/// per non-empty data line.
pub struct SourceReader<R> {
  lines:   std::io::Lines<R>,
  version: SchemaVersion,
  mines:   Option<MineRule>,
  number:  usize,
}

/// Trim the line terminator and surrounding spaces, but not tabs: trailing
/// empty columns are significant.
fn trim_line(s: &str) -> &str { s.trim_matches([' ', '\r', '\n']) }

impl<R: BufRead> SourceReader<R> {
  /// Consume the header and detect the layout. `mines` is set when the file
  /// being read is the mine-bearing publication.
  pub fn open(reader: R, mines: Option<MineRule>) -> Result<Self> {
    let mut lines = reader.lines();
    let mut number = 0;

    let header = loop {
      let Some(raw) = lines.next().transpose()? else {
        return Err(Error::MissingHeader);
      };
      number += 1;
      let trimmed = trim_line(raw.trim_start_matches(BOM));
      if !trimmed.is_empty() {
        break trimmed.to_owned();
      }
    };

    let first = header.split('\t').next().unwrap_or_default();
    let version = SchemaVersion::detect(first)?;
    debug!(layout = version.tag(), "detected column layout");

    Ok(Self { lines, version, mines, number })
  }

  pub fn version(&self) -> SchemaVersion { self.version }

  fn decode(&self, raw: &str) -> Line {
    let cols: Vec<&str> = raw.split('\t').collect();
    if cols.len() > self.version.columns() {
      warn!(
        line = self.number,
        columns = cols.len(),
        expected = self.version.columns(),
        "extra columns ignored"
      );
    }
    let mut line = Record::from_columns(self.version, &cols).normalize();
    if let Some(rule) = &self.mines {
      rule.apply(&mut line);
    }
    line
  }
}

impl<R: BufRead> Iterator for SourceReader<R> {
  type Item = Result<SourceLine>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let raw = match self.lines.next()? {
        Ok(raw) => raw,
        Err(e) => return Some(Err(e.into())),
      };
      self.number += 1;
      let trimmed = trim_line(&raw);
      if trimmed.is_empty() {
        continue;
      }
      let line = self.decode(trimmed);
      return Some(Ok(SourceLine {
        number: self.number,
        raw: trimmed.to_owned(),
        line,
      }));
    }
  }
}
