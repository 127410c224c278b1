//! Synchronous get-or-create helpers.
//!
//! Each takes a plain `&rusqlite::Connection` so it can run either on its own
//! or inside the per-line transaction of [`group`] (a
//! `rusqlite::Transaction` derefs to a connection). Lookups return the lowest
//! matching id, so the first record in stored order wins.

use rusqlite::{Connection, OptionalExtension as _, params};
use wld_core::{
  key::{
    DescriptionKey, HeadwordKey, IssueKey, KeywordKey, KeywordMatch, LocationKey,
    MineKey,
  },
  model::{Entry, Pk},
  store::{GroupKeys, GroupRefs},
};

type Sql<T> = rusqlite::Result<T>;

fn first_id(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Sql<Option<Pk>> {
  conn
    .query_row(sql, params, |r| r.get(0).map(Pk))
    .optional()
}

fn inserted(conn: &Connection) -> Pk { Pk(conn.last_insert_rowid()) }

// ─── Lexical records ─────────────────────────────────────────────────────────

pub fn headword(conn: &Connection, key: &HeadwordKey) -> Sql<Pk> {
  if let Some(pk) = first_id(
    conn,
    "SELECT id FROM headwords WHERE gloss = ?1 ORDER BY id LIMIT 1",
    params![key.gloss],
  )? {
    return Ok(pk);
  }
  conn.execute("INSERT INTO headwords (gloss) VALUES (?1)", params![key.gloss])?;
  Ok(inserted(conn))
}

pub fn description(conn: &Connection, key: &DescriptionKey) -> Sql<Pk> {
  if let Some(pk) = first_id(
    conn,
    "SELECT id FROM descriptions
     WHERE source_list = ?1 AND book = ?2 AND note = ?3
     ORDER BY id LIMIT 1",
    params![key.source_list, key.book, key.note],
  )? {
    return Ok(pk);
  }
  conn.execute(
    "INSERT INTO descriptions (source_list, book, note) VALUES (?1, ?2, ?3)",
    params![key.source_list, key.book, key.note],
  )?;
  Ok(inserted(conn))
}

pub fn headword_description(conn: &Connection, headword: Pk, description: Pk) -> Sql<Pk> {
  if let Some(pk) = first_id(
    conn,
    "SELECT id FROM headword_descriptions
     WHERE headword_id = ?1 AND description_id = ?2",
    params![headword.get(), description.get()],
  )? {
    return Ok(pk);
  }
  conn.execute(
    "INSERT INTO headword_descriptions (headword_id, description_id) VALUES (?1, ?2)",
    params![headword.get(), description.get()],
  )?;
  Ok(inserted(conn))
}

pub fn keyword(conn: &Connection, key: &KeywordKey, policy: KeywordMatch) -> Sql<Pk> {
  let found = match key.compared_note(policy) {
    None => first_id(
      conn,
      "SELECT id FROM keywords WHERE word = ?1 ORDER BY id LIMIT 1",
      params![key.word],
    )?,
    Some(note) => first_id(
      conn,
      "SELECT id FROM keywords WHERE word = ?1 AND note = ?2 ORDER BY id LIMIT 1",
      params![key.word, note],
    )?,
  };
  if let Some(pk) = found {
    return Ok(pk);
  }
  let record = key.clone().into_record();
  conn.execute(
    "INSERT INTO keywords (word, note, visible) VALUES (?1, ?2, ?3)",
    params![record.word, record.note, record.visible],
  )?;
  Ok(inserted(conn))
}

// ─── Places ──────────────────────────────────────────────────────────────────

pub fn location(conn: &Connection, key: &LocationKey) -> Sql<Pk> {
  if let Some(pk) = first_id(
    conn,
    "SELECT id FROM locations WHERE city = ?1 AND new_code = ?2 ORDER BY id LIMIT 1",
    params![key.city, key.new_code],
  )? {
    return Ok(pk);
  }
  let record = key.clone().into_record();
  conn.execute(
    "INSERT INTO locations (city, old_code, new_code, note, visible)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      record.city,
      record.old_code,
      record.new_code,
      record.note,
      record.visible
    ],
  )?;
  Ok(inserted(conn))
}

pub fn mine(conn: &Connection, key: &MineKey) -> Sql<Pk> {
  if let Some(pk) = first_id(
    conn,
    "SELECT id FROM mines WHERE name = ?1 ORDER BY id LIMIT 1",
    params![key.name],
  )? {
    return Ok(pk);
  }
  let record = key.clone().into_record();
  conn.execute(
    "INSERT INTO mines (name, location, note) VALUES (?1, ?2, ?3)",
    params![record.name, record.location, record.note],
  )?;
  Ok(inserted(conn))
}

pub fn entry_mine(conn: &Connection, entry: Pk, mine: Pk) -> Sql<Pk> {
  if let Some(pk) = first_id(
    conn,
    "SELECT id FROM entry_mines WHERE entry_id = ?1 AND mine_id = ?2",
    params![entry.get(), mine.get()],
  )? {
    return Ok(pk);
  }
  conn.execute(
    "INSERT INTO entry_mines (entry_id, mine_id) VALUES (?1, ?2)",
    params![entry.get(), mine.get()],
  )?;
  Ok(inserted(conn))
}

// ─── Publication ─────────────────────────────────────────────────────────────

/// Lookup only. A key without a section matches any section.
pub fn issue(conn: &Connection, key: IssueKey) -> Sql<Option<Pk>> {
  first_id(
    conn,
    "SELECT id FROM issues
     WHERE part = ?1 AND number = ?2 AND (?3 IS NULL OR section = ?3)
     ORDER BY id LIMIT 1",
    params![key.part, key.number, key.section],
  )
}

// ─── Entries ─────────────────────────────────────────────────────────────────

pub fn last_entry(conn: &Connection) -> Sql<Pk> {
  conn.query_row("SELECT COALESCE(MAX(id), 0) FROM entries", [], |r| {
    r.get(0).map(Pk)
  })
}

fn equal_entry(conn: &Connection, entry: &Entry) -> Sql<Option<Pk>> {
  first_id(
    conn,
    "SELECT id FROM entries
     WHERE headword_id = ?1 AND description_id = ?2 AND location_id = ?3
       AND keyword_id = ?4 AND issue_id = ?5
       AND dialect_word = ?6 AND note = ?7 AND location_note = ?8
     ORDER BY id LIMIT 1",
    params![
      entry.headword.get(),
      entry.description.get(),
      entry.location.get(),
      entry.keyword.get(),
      entry.issue.get(),
      entry.dialect_word,
      entry.note,
      entry.location_note,
    ],
  )
}

pub fn entry(conn: &Connection, pk: Pk, entry: &Entry, dedupe: bool) -> Sql<Pk> {
  if dedupe && let Some(existing) = equal_entry(conn, entry)? {
    return Ok(existing);
  }
  conn.execute(
    "INSERT INTO entries (
       id, dialect_word, note, location_note,
       headword_id, description_id, location_id, keyword_id, issue_id
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      pk.get(),
      entry.dialect_word,
      entry.note,
      entry.location_note,
      entry.headword.get(),
      entry.description.get(),
      entry.location.get(),
      entry.keyword.get(),
      entry.issue.get(),
    ],
  )?;
  Ok(pk)
}

// ─── Grouping ────────────────────────────────────────────────────────────────

pub fn group(conn: &Connection, keys: &GroupKeys, policy: KeywordMatch) -> Sql<GroupRefs> {
  let headword = headword(conn, &keys.headword)?;
  let description = description(conn, &keys.description)?;
  let headword_description = headword_description(conn, headword, description)?;
  let location = location(conn, &keys.location)?;
  let keyword = keyword(conn, &keys.keyword, policy)?;
  Ok(GroupRefs {
    headword,
    description,
    headword_description,
    location,
    keyword,
  })
}
