//! [`SqliteStore`]: the SQLite implementation of [`IdentityStore`] and
//! [`Catalog`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, params};
use tracing::{debug, info};

use wld_core::{
  catalog::{Catalog, Snapshot, SourceFile},
  key::{
    DescriptionKey, HeadwordKey, IssueKey, KeywordKey, LocationKey, MineKey,
    ResolverConfig, cmp_folded,
  },
  model::{Entry, Issue, Model, Pk},
  status::{Method, Phase, RunStatus},
  store::{GroupKeys, GroupRefs, IdentityStore},
};

use crate::{
  encode::{
    RawSourceFile, RawStatus, SOURCE_FILE_COLUMNS, encode_count, encode_dt,
    issue_from_row, location_from_row, mine_from_row,
  },
  resolve,
  schema::{COLLATION, SCHEMA},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dictionary store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. A clone
/// shares the database and the resolver policy.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  config: ResolverConfig,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, config: ResolverConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, config };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory(config: ResolverConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, config };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_collation(COLLATION, cmp_folded)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Administration ──────────────────────────────────────────────────────

  /// Register a publication issue. Issues are never created by a run, so
  /// this is how they get into the store.
  pub async fn register_issue(&self, issue: Issue) -> Result<Pk> {
    let key = IssueKey::new(issue.part, issue.section, issue.number);
    let pk = self
      .conn
      .call(move |conn| {
        let existing: Option<i64> = conn
          .query_row(
            "SELECT id FROM issues WHERE part = ?1 AND section IS ?2 AND number = ?3",
            params![issue.part, issue.section, issue.number],
            |r| r.get(0),
          )
          .optional()?;
        if existing.is_some() {
          return Ok(None);
        }
        conn.execute(
          "INSERT INTO issues (
             part, section, number, title, year, authors, publication_place, visible
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            issue.part,
            issue.section,
            issue.number,
            issue.title,
            issue.year,
            issue.authors,
            issue.publication_place,
            issue.visible,
          ],
        )?;
        Ok(Some(Pk(conn.last_insert_rowid())))
      })
      .await?;
    let pk = pk.ok_or(Error::DuplicateIssue(key))?;
    info!(%key, %pk, "registered issue");
    Ok(pk)
  }

  /// Forget the processed state of one file, or of every file when `key` is
  /// `None`, so the next run scans it again. Returns the number of files
  /// reset.
  pub async fn clear_processed(&self, key: Option<IssueKey>) -> Result<usize> {
    let n = self
      .conn
      .call(move |conn| {
        let n = match key {
          None => conn.execute(
            "UPDATE source_files SET processed = NULL, read = 0, skipped = 0",
            [],
          )?,
          Some(k) => conn.execute(
            "UPDATE source_files SET processed = NULL, read = 0, skipped = 0
             WHERE part = ?1 AND number = ?2 AND (?3 IS NULL OR section = ?3)",
            params![k.part, k.number, k.section],
          )?,
        };
        Ok(n)
      })
      .await?;
    debug!(files = n, "cleared processed state");
    Ok(n)
  }

  /// Number of stored records of one model.
  pub async fn count(&self, model: Model) -> Result<u64> {
    let table = table_name(model);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(crate::encode::decode_count(n))
  }

  /// Fetch one entry by identity.
  pub async fn get_entry(&self, pk: Pk) -> Result<Option<Entry>> {
    let entry = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT dialect_word, note, location_note, headword_id,
                      description_id, location_id, keyword_id, issue_id
               FROM entries WHERE id = ?1",
              params![pk.get()],
              |r| {
                Ok(Entry {
                  dialect_word:  r.get(0)?,
                  note:          r.get(1)?,
                  location_note: r.get(2)?,
                  headword:      Pk(r.get(3)?),
                  description:   Pk(r.get(4)?),
                  location:      Pk(r.get(5)?),
                  keyword:       Pk(r.get(6)?),
                  issue:         Pk(r.get(7)?),
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(entry)
  }

  /// Names of the mines linked to `entry`, in link order.
  pub async fn entry_mine_names(&self, entry: Pk) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.name FROM entry_mines em
           JOIN mines m ON m.id = em.mine_id
           WHERE em.entry_id = ?1 ORDER BY em.id",
        )?;
        let names = stmt
          .query_map(params![entry.get()], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;
    Ok(names)
  }
}

fn table_name(model: Model) -> &'static str {
  match model {
    Model::Headword => "headwords",
    Model::Description => "descriptions",
    Model::HeadwordDescription => "headword_descriptions",
    Model::Location => "locations",
    Model::Keyword => "keywords",
    Model::Issue => "issues",
    Model::Entry => "entries",
    Model::Mine => "mines",
    Model::EntryMine => "entry_mines",
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn resolve_headword(&mut self, key: HeadwordKey) -> Result<Pk> {
    Ok(self.conn.call(move |conn| Ok(resolve::headword(conn, &key)?)).await?)
  }

  async fn resolve_description(&mut self, key: DescriptionKey) -> Result<Pk> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(resolve::description(conn, &key)?))
        .await?,
    )
  }

  async fn resolve_headword_description(
    &mut self,
    headword: Pk,
    description: Pk,
  ) -> Result<Pk> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(resolve::headword_description(conn, headword, description)?))
        .await?,
    )
  }

  async fn resolve_location(&mut self, key: LocationKey) -> Result<Pk> {
    Ok(self.conn.call(move |conn| Ok(resolve::location(conn, &key)?)).await?)
  }

  async fn resolve_keyword(&mut self, key: KeywordKey) -> Result<Pk> {
    let policy = self.config.keyword_match;
    Ok(
      self
        .conn
        .call(move |conn| Ok(resolve::keyword(conn, &key, policy)?))
        .await?,
    )
  }

  async fn resolve_mine(&mut self, key: MineKey) -> Result<Pk> {
    Ok(self.conn.call(move |conn| Ok(resolve::mine(conn, &key)?)).await?)
  }

  async fn resolve_entry_mine(&mut self, entry: Pk, mine: Pk) -> Result<Pk> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(resolve::entry_mine(conn, entry, mine)?))
        .await?,
    )
  }

  async fn find_issue(&mut self, key: IssueKey) -> Result<Option<Pk>> {
    Ok(self.conn.call(move |conn| Ok(resolve::issue(conn, key)?)).await?)
  }

  async fn last_entry_pk(&mut self) -> Result<Pk> {
    Ok(self.conn.call(|conn| Ok(resolve::last_entry(conn)?)).await?)
  }

  async fn record_entry(&mut self, pk: Pk, entry: Entry) -> Result<Pk> {
    let dedupe = self.config.dedupe_entries;
    Ok(
      self
        .conn
        .call(move |conn| Ok(resolve::entry(conn, pk, &entry, dedupe)?))
        .await?,
    )
  }

  /// One transaction per line: either the whole group commits or none of it
  /// does.
  async fn resolve_group(&mut self, keys: GroupKeys) -> Result<GroupRefs> {
    let policy = self.config.keyword_match;
    let refs = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let refs = resolve::group(&tx, &keys, policy)?;
        tx.commit()?;
        Ok(refs)
      })
      .await?;
    Ok(refs)
  }
}

// ─── Catalog impl ────────────────────────────────────────────────────────────

impl Catalog for SqliteStore {
  type Error = Error;

  async fn source_files(&self) -> Result<Vec<SourceFile>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {SOURCE_FILE_COLUMNS} FROM source_files ORDER BY id"))?;
        let raws = stmt
          .query_map([], RawSourceFile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawSourceFile::into_source_file).collect()
  }

  async fn find_source_file(&self, key: IssueKey) -> Result<Option<SourceFile>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SOURCE_FILE_COLUMNS} FROM source_files
                 WHERE part = ?1 AND number = ?2 AND (?3 IS NULL OR section = ?3)
                 ORDER BY id LIMIT 1"
              ),
              params![key.part, key.number, key.section],
              RawSourceFile::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSourceFile::into_source_file).transpose()
  }

  async fn register_source_file(&self, key: IssueKey, path: PathBuf) -> Result<SourceFile> {
    let path = path.to_string_lossy().into_owned();
    let raw = self
      .conn
      .call(move |conn| {
        let existing: Option<i64> = conn
          .query_row(
            "SELECT id FROM source_files WHERE part = ?1 AND section IS ?2 AND number = ?3",
            params![key.part, key.section, key.number],
            |r| r.get(0),
          )
          .optional()?;
        let id = match existing {
          Some(id) => {
            conn.execute(
              "UPDATE source_files SET path = ?1 WHERE id = ?2",
              params![path, id],
            )?;
            id
          }
          None => {
            conn.execute(
              "INSERT INTO source_files (part, section, number, path) VALUES (?1, ?2, ?3, ?4)",
              params![key.part, key.section, key.number, path],
            )?;
            conn.last_insert_rowid()
          }
        };
        let raw = conn.query_row(
          &format!("SELECT {SOURCE_FILE_COLUMNS} FROM source_files WHERE id = ?1"),
          params![id],
          RawSourceFile::from_row,
        )?;
        Ok(raw)
      })
      .await?;
    raw.into_source_file()
  }

  async fn mark_processed(
    &self,
    id: Pk,
    read: u64,
    skipped: u64,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let at = encode_dt(at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE source_files SET processed = ?1, read = ?2, skipped = ?3 WHERE id = ?4",
          params![at, encode_count(read), encode_count(skipped), id.get()],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn create_status(&self, method: Method) -> Result<RunStatus> {
    let label = Phase::Idle.label();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO run_status (read, skipped, status, method) VALUES (0, 0, ?1, ?2)",
          params![label, method.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(RunStatus::new(Pk(id), method))
  }

  async fn save_status(&self, status: RunStatus) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE run_status SET read = ?1, skipped = ?2, status = ?3, method = ?4
           WHERE id = ?5",
          params![
            encode_count(status.read),
            encode_count(status.skipped),
            status.status,
            status.method.as_str(),
            status.id.get(),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_status(&self, id: Pk) -> Result<Option<RunStatus>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, read, skipped, status, method FROM run_status WHERE id = ?1",
              params![id.get()],
              RawStatus::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawStatus::into_status).transpose()
  }

  async fn snapshot(&self) -> Result<Snapshot> {
    let snapshot = self
      .conn
      .call(|conn| {
        let locations = conn
          .prepare(
            "SELECT id, city, old_code, new_code, note, visible FROM locations ORDER BY id",
          )?
          .query_map([], location_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let issues = conn
          .prepare(
            "SELECT id, part, section, number, title, year, authors,
                    publication_place, visible
             FROM issues ORDER BY id",
          )?
          .query_map([], issue_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let mines = conn
          .prepare("SELECT id, name, location, note FROM mines ORDER BY id")?
          .query_map([], mine_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let last_entry = resolve::last_entry(conn)?;
        Ok(Snapshot { locations, issues, mines, last_entry })
      })
      .await?;
    Ok(snapshot)
  }
}
