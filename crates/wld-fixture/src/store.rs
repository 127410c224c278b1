//! [`StagingStore`]: the run-scoped implementation of [`IdentityStore`].
//!
//! Locations, issues and mines are seeded from the durable snapshot; every
//! other table starts empty. A record created during the run is appended to
//! its table and written to the current fixture document in the same step,
//! so the fixture always holds exactly the records the run added.

use std::{
  fs::{self, File},
  io::BufWriter,
  path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::{debug, info};

use wld_core::{
  catalog::Snapshot,
  key::{
    DescriptionKey, HeadwordKey, IssueKey, KeywordKey, LocationKey, MineKey,
    ResolverConfig,
  },
  model::{
    Description, Entry, EntryMine, Headword, HeadwordDescription, Issue, Keyword,
    Location, Mine, Model, Pk,
  },
  store::IdentityStore,
};

use crate::{Error, Result, table::Table, writer::FixtureWriter};

type Out = FixtureWriter<BufWriter<File>>;

/// Identity back-end for the staged method.
pub struct StagingStore {
  config:                ResolverConfig,
  output_dir:            PathBuf,
  headwords:             Table<Headword>,
  descriptions:          Table<Description>,
  headword_descriptions: Table<HeadwordDescription>,
  locations:             Table<Location>,
  keywords:              Table<Keyword>,
  issues:                Table<Issue>,
  entries:               Table<Entry>,
  mines:                 Table<Mine>,
  entry_mines:           Table<EntryMine>,
  /// Highest entry identity already in durable storage.
  stored_entries:        Pk,
  out:                   Option<Out>,
}

/// Append `record` under `pk` and write it to the open fixture.
fn stage<T: Serialize>(
  table: &mut Table<T>,
  out: &mut Option<Out>,
  model: Model,
  pk: Pk,
  record: T,
) -> Result<Pk> {
  let out = out.as_mut().ok_or(Error::NoOpenFile)?;
  out.append(model, pk, &record)?;
  table.push(pk, record);
  Ok(pk)
}

impl StagingStore {
  /// A fresh store for one run. Fixture files go to `output_dir`.
  pub fn new(
    snapshot: Snapshot,
    config: ResolverConfig,
    output_dir: impl Into<PathBuf>,
  ) -> Self {
    debug!(
      locations = snapshot.locations.len(),
      issues = snapshot.issues.len(),
      mines = snapshot.mines.len(),
      "seeding staging tables"
    );
    Self {
      config,
      output_dir: output_dir.into(),
      headwords: Table::default(),
      descriptions: Table::default(),
      headword_descriptions: Table::default(),
      locations: Table::seeded(snapshot.locations),
      keywords: Table::default(),
      issues: Table::seeded(snapshot.issues),
      entries: Table::default(),
      mines: Table::seeded(snapshot.mines),
      entry_mines: Table::default(),
      stored_entries: snapshot.last_entry,
      out: None,
    }
  }

  /// Where the fixture document for `key` is written.
  pub fn fixture_path(&self, key: &IssueKey) -> PathBuf {
    fixture_path(&self.output_dir, key)
  }

  /// Number of staged rows of one model, seeded rows included.
  pub fn len(&self, model: Model) -> usize {
    match model {
      Model::Headword => self.headwords.len(),
      Model::Description => self.descriptions.len(),
      Model::HeadwordDescription => self.headword_descriptions.len(),
      Model::Location => self.locations.len(),
      Model::Keyword => self.keywords.len(),
      Model::Issue => self.issues.len(),
      Model::Entry => self.entries.len(),
      Model::Mine => self.mines.len(),
      Model::EntryMine => self.entry_mines.len(),
    }
  }
}

/// `{output_dir}/{stem}.json` for the file with coordinates `key`.
fn fixture_path(output_dir: &Path, key: &IssueKey) -> PathBuf {
  output_dir.join(format!("{}.json", key.file_stem()))
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for StagingStore {
  type Error = Error;

  async fn resolve_headword(&mut self, key: HeadwordKey) -> Result<Pk> {
    if let Some(pk) = self.headwords.find(|h| key.matches(h)) {
      return Ok(pk);
    }
    let pk = self.headwords.next_pk();
    stage(&mut self.headwords, &mut self.out, Model::Headword, pk, key.into_record())
  }

  async fn resolve_description(&mut self, key: DescriptionKey) -> Result<Pk> {
    if let Some(pk) = self.descriptions.find(|d| key.matches(d)) {
      return Ok(pk);
    }
    let pk = self.descriptions.next_pk();
    stage(
      &mut self.descriptions,
      &mut self.out,
      Model::Description,
      pk,
      key.into_record(),
    )
  }

  async fn resolve_headword_description(
    &mut self,
    headword: Pk,
    description: Pk,
  ) -> Result<Pk> {
    let join = HeadwordDescription { headword, description };
    if let Some(pk) = self.headword_descriptions.find(|j| *j == join) {
      return Ok(pk);
    }
    let pk = self.headword_descriptions.next_pk();
    stage(
      &mut self.headword_descriptions,
      &mut self.out,
      Model::HeadwordDescription,
      pk,
      join,
    )
  }

  async fn resolve_location(&mut self, key: LocationKey) -> Result<Pk> {
    if let Some(pk) = self.locations.find(|l| key.matches(l)) {
      return Ok(pk);
    }
    let pk = self.locations.next_pk();
    stage(&mut self.locations, &mut self.out, Model::Location, pk, key.into_record())
  }

  async fn resolve_keyword(&mut self, key: KeywordKey) -> Result<Pk> {
    let policy = self.config.keyword_match;
    if let Some(pk) = self.keywords.find(|k| key.matches(k, policy)) {
      return Ok(pk);
    }
    let pk = self.keywords.next_pk();
    stage(&mut self.keywords, &mut self.out, Model::Keyword, pk, key.into_record())
  }

  async fn resolve_mine(&mut self, key: MineKey) -> Result<Pk> {
    if let Some(pk) = self.mines.find(|m| key.matches(m)) {
      return Ok(pk);
    }
    let pk = self.mines.next_pk();
    stage(&mut self.mines, &mut self.out, Model::Mine, pk, key.into_record())
  }

  async fn resolve_entry_mine(&mut self, entry: Pk, mine: Pk) -> Result<Pk> {
    let join = EntryMine { entry, mine };
    if let Some(pk) = self.entry_mines.find(|j| *j == join) {
      return Ok(pk);
    }
    let pk = self.entry_mines.next_pk();
    stage(&mut self.entry_mines, &mut self.out, Model::EntryMine, pk, join)
  }

  async fn find_issue(&mut self, key: IssueKey) -> Result<Option<Pk>> {
    Ok(self.issues.find(|i| key.matches(i)))
  }

  async fn last_entry_pk(&mut self) -> Result<Pk> {
    Ok(self.stored_entries.max(self.entries.last_pk()))
  }

  async fn record_entry(&mut self, pk: Pk, entry: Entry) -> Result<Pk> {
    if self.config.dedupe_entries
      && let Some(existing) = self.entries.find(|e| e.same_as(&entry))
    {
      return Ok(existing);
    }
    stage(&mut self.entries, &mut self.out, Model::Entry, pk, entry)
  }

  async fn begin_file(&mut self, key: IssueKey) -> Result<()> {
    fs::create_dir_all(&self.output_dir)?;
    let path = self.fixture_path(&key);
    // A previous file that failed part-way is left unterminated.
    self.out = Some(FixtureWriter::create(&path)?);
    info!(path = %path.display(), "writing fixture");
    Ok(())
  }

  async fn finish_file(&mut self) -> Result<()> {
    if let Some(out) = self.out.take() {
      let records = out.records();
      out.finish()?;
      debug!(records, "fixture closed");
    }
    Ok(())
  }
}
