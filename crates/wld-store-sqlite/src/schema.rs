//! SQL schema for the dictionary store.
//!
//! Executed once at connection startup, after the [`COLLATION`] has been
//! registered. Every text column that takes part in an identity key is
//! declared with it, so equality in `WHERE` clauses folds case the same way
//! the staging store does, accented letters included.

/// Name of the case-folding collation backed by
/// [`wld_core::key::cmp_folded`].
pub const COLLATION: &str = "FOLD";

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS headwords (
    id     INTEGER PRIMARY KEY,
    gloss  TEXT NOT NULL COLLATE FOLD
);

CREATE TABLE IF NOT EXISTS descriptions (
    id           INTEGER PRIMARY KEY,
    source_list  TEXT NOT NULL COLLATE FOLD,
    book         TEXT NOT NULL COLLATE FOLD,
    note         TEXT NOT NULL COLLATE FOLD
);

CREATE TABLE IF NOT EXISTS headword_descriptions (
    id              INTEGER PRIMARY KEY,
    headword_id     INTEGER NOT NULL REFERENCES headwords(id),
    description_id  INTEGER NOT NULL REFERENCES descriptions(id),
    UNIQUE (headword_id, description_id)
);

CREATE TABLE IF NOT EXISTS locations (
    id        INTEGER PRIMARY KEY,
    city      TEXT NOT NULL COLLATE FOLD,
    old_code  TEXT NOT NULL DEFAULT '-',
    new_code  TEXT NOT NULL COLLATE FOLD,
    note      TEXT NOT NULL DEFAULT '',
    visible   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS keywords (
    id       INTEGER PRIMARY KEY,
    word     TEXT NOT NULL COLLATE FOLD,
    note     TEXT NOT NULL DEFAULT '' COLLATE FOLD,
    visible  INTEGER NOT NULL DEFAULT 1
);

-- Registered administratively; the importer only reads this table.
CREATE TABLE IF NOT EXISTS issues (
    id                 INTEGER PRIMARY KEY,
    part               INTEGER NOT NULL,
    section            INTEGER,           -- NULL when the part has no sections
    number             INTEGER NOT NULL,
    title              TEXT NOT NULL DEFAULT '',
    year               INTEGER NOT NULL DEFAULT 0,
    authors            TEXT NOT NULL DEFAULT '',
    publication_place  TEXT NOT NULL DEFAULT '',
    visible            INTEGER NOT NULL DEFAULT 1
);

-- Entry ids are assigned by the import controller, not by SQLite.
CREATE TABLE IF NOT EXISTS entries (
    id              INTEGER PRIMARY KEY,
    dialect_word    TEXT NOT NULL COLLATE FOLD,
    note            TEXT NOT NULL DEFAULT '' COLLATE FOLD,
    location_note   TEXT NOT NULL DEFAULT '' COLLATE FOLD,
    headword_id     INTEGER NOT NULL REFERENCES headwords(id),
    description_id  INTEGER NOT NULL REFERENCES descriptions(id),
    location_id     INTEGER NOT NULL REFERENCES locations(id),
    keyword_id      INTEGER NOT NULL REFERENCES keywords(id),
    issue_id        INTEGER NOT NULL REFERENCES issues(id)
);

CREATE TABLE IF NOT EXISTS mines (
    id        INTEGER PRIMARY KEY,
    name      TEXT NOT NULL COLLATE FOLD,
    location  TEXT NOT NULL DEFAULT '',
    note      TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS entry_mines (
    id        INTEGER PRIMARY KEY,
    entry_id  INTEGER NOT NULL REFERENCES entries(id),
    mine_id   INTEGER NOT NULL REFERENCES mines(id),
    UNIQUE (entry_id, mine_id)
);

CREATE TABLE IF NOT EXISTS source_files (
    id         INTEGER PRIMARY KEY,
    part       INTEGER NOT NULL,
    section    INTEGER,
    number     INTEGER NOT NULL,
    path       TEXT NOT NULL,
    processed  TEXT,                      -- RFC 3339 UTC; NULL until done
    read       INTEGER NOT NULL DEFAULT 0,
    skipped    INTEGER NOT NULL DEFAULT 0
);

-- Polled by the status endpoint while a run writes it.
CREATE TABLE IF NOT EXISTS run_status (
    id       INTEGER PRIMARY KEY,
    read     INTEGER NOT NULL DEFAULT 0,
    skipped  INTEGER NOT NULL DEFAULT 0,
    status   TEXT NOT NULL,
    method   TEXT NOT NULL                -- 'direct' | 'staged'
);

CREATE INDEX IF NOT EXISTS headwords_gloss_idx   ON headwords(gloss);
CREATE INDEX IF NOT EXISTS locations_key_idx     ON locations(city, new_code);
CREATE INDEX IF NOT EXISTS keywords_word_idx     ON keywords(word);
CREATE INDEX IF NOT EXISTS mines_name_idx        ON mines(name);
CREATE INDEX IF NOT EXISTS entries_issue_idx     ON entries(issue_id);
CREATE INDEX IF NOT EXISTS issues_key_idx        ON issues(part, number);

PRAGMA user_version = 1;
";
