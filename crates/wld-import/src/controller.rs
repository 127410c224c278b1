//! The import controller: drives source files through the reader, validator
//! and identity store, and keeps the run status current.
//!
//! ```text
//! idle → preparing → working(file)* → done
//!                         └──────────→ error
//! ```
//!
//! Files are processed one after another and each line is fully resolved
//! before the next one is read. A file counts as done only once it has been
//! read to the end; a failure part-way leaves it unprocessed and aborts the
//! whole run.

use std::{
  collections::BTreeMap,
  fs::{self, File},
  io::BufReader,
  path::{Path, PathBuf},
  sync::Arc,
};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use wld_core::{
  catalog::{Catalog, SourceFile},
  key::{IssueKey, MineKey},
  model::{Entry, Pk},
  status::{Method, Phase, RunStatus},
  store::IdentityStore,
};
use wld_fixture::SkipWriter;
use wld_tsv::{MineRule, SourceLine, SourceReader, validate};

use crate::{
  config::ImportConfig,
  error::{ImportError, Result},
};

const PROGRESS_LOG_EVERY: u64 = 1000;

// ─── Selection ───────────────────────────────────────────────────────────────

/// Which source files a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
  /// Every registered file.
  Everything,
  /// The file with these coordinates. A `file` path, when given, replaces
  /// the registered one (and registers the file if it was not yet known).
  One { key: IssueKey, file: Option<PathBuf> },
}

impl Selection {
  /// Build a selection from raw coordinates; all three zero means
  /// everything, and a zero section means "no section".
  pub fn from_coordinates(
    part: u32,
    section: u32,
    issue: u32,
    file: Option<PathBuf>,
  ) -> Self {
    if part == 0 && section == 0 && issue == 0 {
      return Self::Everything;
    }
    let section = (section != 0).then_some(section);
    Self::One { key: IssueKey::new(part, section, issue), file }
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Counts for one processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
  pub key:        IssueKey,
  pub read:       u64,
  pub skipped:    u64,
  /// Accepted lines that resolved to an existing entry.
  pub duplicates: u64,
  /// Rejections by failing field, keyed `line-1` … `line-5`.
  pub reasons:    BTreeMap<String, u64>,
}

impl FileReport {
  fn new(key: IssueKey) -> Self {
    Self {
      key,
      read: 0,
      skipped: 0,
      duplicates: 0,
      reasons: BTreeMap::new(),
    }
  }

  fn lines(&self) -> u64 { self.read + self.skipped }
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
  pub status:            Pk,
  pub method:            Method,
  pub files:             Vec<FileReport>,
  /// Files passed over because they were already processed.
  pub already_processed: usize,
}

impl RunSummary {
  pub fn read(&self) -> u64 { self.files.iter().map(|f| f.read).sum() }

  pub fn skipped(&self) -> u64 { self.files.iter().map(|f| f.skipped).sum() }
}

// ─── Options ─────────────────────────────────────────────────────────────────

/// The part of [`ImportConfig`] the controller itself uses.
#[derive(Debug, Clone)]
pub struct RunOptions {
  pub input_dir:      PathBuf,
  pub output_dir:     PathBuf,
  pub method:         Method,
  pub mines:          MineRule,
  pub progress_every: u64,
}

impl From<&ImportConfig> for RunOptions {
  fn from(cfg: &ImportConfig) -> Self {
    Self {
      input_dir:      cfg.input_dir.clone(),
      output_dir:     cfg.output_dir.clone(),
      method:         cfg.method,
      mines:          cfg.mines.clone(),
      progress_every: cfg.progress_every,
    }
  }
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// One import run over a catalog `C` with identities from `S`.
pub struct Controller<C, S> {
  catalog: Arc<C>,
  store:   S,
  options: RunOptions,
}

impl<C, S> Controller<C, S>
where
  C: Catalog,
  S: IdentityStore,
{
  /// A `progress_every` of zero is taken as one.
  pub fn new(catalog: Arc<C>, store: S, mut options: RunOptions) -> Self {
    options.progress_every = options.progress_every.max(1);
    Self { catalog, store, options }
  }

  /// Run the import. The status record is created first, so a failure at
  /// any later point is visible to pollers as `error`.
  pub async fn run(self, selection: Selection) -> Result<RunSummary> {
    let status = self
      .catalog
      .create_status(self.options.method)
      .await
      .map_err(ImportError::store)?;
    self.run_with_status(selection, status).await
  }

  /// Run the import, reporting progress through an existing status record.
  pub async fn run_with_status(
    mut self,
    selection: Selection,
    mut status: RunStatus,
  ) -> Result<RunSummary> {
    info!(run = %status.id, method = %status.method, ?selection, "import started");

    let result = self.run_files(selection, &mut status).await;
    match &result {
      Ok(summary) => {
        status.set_phase(Phase::Done);
        info!(
          run = %status.id,
          files = summary.files.len(),
          read = summary.read(),
          skipped = summary.skipped(),
          "import finished"
        );
      }
      Err(e) => {
        status.set_phase(Phase::Error);
        error!(run = %status.id, error = %e, "import failed");
      }
    }
    let saved = self.catalog.save_status(status).await;
    let summary = result?;
    saved.map_err(ImportError::store)?;
    Ok(summary)
  }

  async fn run_files(
    &mut self,
    selection: Selection,
    status: &mut RunStatus,
  ) -> Result<RunSummary> {
    status.set_phase(Phase::Preparing);
    self.save(status).await?;

    let files = self.select(selection).await?;

    // Every input must be present before anything is written.
    for file in files.iter().filter(|f| !f.is_processed()) {
      let path = self.source_path(file);
      if !path.is_file() {
        return Err(ImportError::MissingFile(path));
      }
    }

    let mut summary = RunSummary {
      status:            status.id,
      method:            status.method,
      files:             Vec::new(),
      already_processed: 0,
    };
    let mut next_entry = self
      .store
      .last_entry_pk()
      .await
      .map_err(ImportError::store)?
      .next();

    for file in files {
      if file.is_processed() {
        info!(key = %file.key, "already processed, skipping");
        summary.already_processed += 1;
        continue;
      }
      status.set_phase(Phase::Working(file.key));
      status.read = 0;
      status.skipped = 0;
      self.save(status).await?;

      let report = self.import_file(&file, status, &mut next_entry).await?;
      self
        .catalog
        .mark_processed(file.id, report.read, report.skipped, Utc::now())
        .await
        .map_err(ImportError::store)?;
      summary.files.push(report);
    }
    Ok(summary)
  }

  async fn select(&self, selection: Selection) -> Result<Vec<SourceFile>> {
    let catalog = &self.catalog;
    match selection {
      Selection::Everything => catalog.source_files().await.map_err(ImportError::store),
      Selection::One { key, file: Some(path) } => {
        // Checked before registering, so a mistyped path is never stored.
        let full = self.resolve_path(&path);
        if !full.is_file() {
          return Err(ImportError::MissingFile(full));
        }
        let file = catalog
          .register_source_file(key, path)
          .await
          .map_err(ImportError::store)?;
        Ok(vec![file])
      }
      Selection::One { key, file: None } => {
        let file = catalog
          .find_source_file(key)
          .await
          .map_err(ImportError::store)?
          .ok_or(ImportError::UnknownFile(key))?;
        Ok(vec![file])
      }
    }
  }

  fn resolve_path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.options.input_dir.join(path)
    }
  }

  fn source_path(&self, file: &SourceFile) -> PathBuf { self.resolve_path(&file.path) }

  fn skip_path(&self, key: &IssueKey) -> PathBuf {
    self.options.output_dir.join(format!("{}.skip", key.file_stem()))
  }

  async fn save(&self, status: &RunStatus) -> Result<()> {
    self
      .catalog
      .save_status(status.clone())
      .await
      .map_err(ImportError::store)
  }

  // ── One file ──────────────────────────────────────────────────────────

  async fn import_file(
    &mut self,
    file: &SourceFile,
    status: &mut RunStatus,
    next_entry: &mut Pk,
  ) -> Result<FileReport> {
    let key = file.key;
    let path = self.source_path(file);
    info!(%key, path = %path.display(), "processing file");

    let issue = self
      .store
      .find_issue(key)
      .await
      .map_err(ImportError::store)?
      .ok_or(ImportError::IssueNotFound(key))?;

    let mines = self
      .options
      .mines
      .applies_to(&key)
      .then(|| self.options.mines.clone());
    let reader = SourceReader::open(BufReader::new(File::open(&path)?), mines)?;
    debug!(%key, layout = reader.version().tag(), "header accepted");

    self.store.begin_file(key).await.map_err(ImportError::store)?;
    fs::create_dir_all(&self.options.output_dir)?;
    let mut skip = SkipWriter::create(&self.skip_path(&key))?;

    let mut report = FileReport::new(key);
    for line in reader {
      let line = line?;
      match validate::first_invalid(&line.line) {
        Some(field) => {
          debug!(%key, line = line.number, field = field.name(), "line rejected");
          skip.write_line(&line.raw)?;
          report.skipped += 1;
          *report
            .reasons
            .entry(format!("line-{}", field.index()))
            .or_default() += 1;
        }
        None => {
          self.accept(line, issue, next_entry, &mut report).await?;
        }
      }

      if report.lines() % self.options.progress_every == 0 {
        status.read = report.read;
        status.skipped = report.skipped;
        self.save(status).await?;
      }
      if report.lines() % PROGRESS_LOG_EVERY == 0 {
        debug!(%key, read = report.read, skipped = report.skipped, "progress");
      }
    }

    skip.finish()?;
    self.store.finish_file().await.map_err(ImportError::store)?;

    status.read = report.read;
    status.skipped = report.skipped;
    self.save(status).await?;

    if report.skipped > 0 {
      warn!(%key, skipped = report.skipped, reasons = ?report.reasons, "lines rejected");
    }
    info!(
      %key,
      read = report.read,
      skipped = report.skipped,
      duplicates = report.duplicates,
      "file done"
    );
    Ok(report)
  }

  /// Resolve one valid line and record its entry and mines.
  async fn accept(
    &mut self,
    source: SourceLine,
    issue: Pk,
    next_entry: &mut Pk,
    report: &mut FileReport,
  ) -> Result<()> {
    let line = source.line;
    let refs = self
      .store
      .resolve_group(line.group_keys())
      .await
      .map_err(ImportError::store)?;

    let pk = *next_entry;
    let entry = Entry {
      dialect_word:  line.dialect_word,
      note:          line.entry_note,
      location_note: line.entry_location_note,
      headword:      refs.headword,
      description:   refs.description,
      location:      refs.location,
      keyword:       refs.keyword,
      issue,
    };
    let stored = self
      .store
      .record_entry(pk, entry)
      .await
      .map_err(ImportError::store)?;
    if stored == pk {
      *next_entry = pk.next();
    } else {
      report.duplicates += 1;
    }

    for name in line.mines {
      let mine = self
        .store
        .resolve_mine(MineKey::new(name))
        .await
        .map_err(ImportError::store)?;
      self
        .store
        .resolve_entry_mine(stored, mine)
        .await
        .map_err(ImportError::store)?;
    }

    report.read += 1;
    Ok(())
  }
}
