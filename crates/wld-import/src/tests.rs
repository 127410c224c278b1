//! End-to-end controller runs over temporary input and output directories.

use std::{fs, path::PathBuf, sync::Arc};

use serde_json::Value;
use tempfile::TempDir;
use wld_core::{
  catalog::Catalog,
  key::{IssueKey, ResolverConfig},
  model::{Issue, Model, Pk},
  status::Method,
};
use wld_fixture::StagingStore;
use wld_store_sqlite::SqliteStore;
use wld_tsv::MineRule;

use crate::{Controller, ImportError, RunOptions, RunSummary, Selection};

const REVISED_HEADER: &str = "lemma.name\tlemma.toelichting\tlemma.bronnenlijst\ttrefwoord.name\ttrefwoord.toelichting\tdialectopgave.name\tdialectopgave.toelichting\tdialect.kloeke\tdialect.nieuw\tdialect.stad\tdialectopgave.kloeketoelichting";

const LEGACY_HEADER: &str = "Lemmanummer\tLemmatitel\tVraag\tTrefwoord\tLex\tFon\tVragenlijst\tVraagnummer\tBoek\tPagina\tPlaatsnaam\tRegio\tSubregio\tInformant\tCommentaar\tKloeke";

fn revised_row(headword: &str, keyword: &str, word: &str, city: &str) -> String {
  format!("{headword}\t\tN12\t{keyword}\t\t{word}\t\tQ95\tQ095p\t{city}\t")
}

fn legacy_row(city: &str, comment: &str) -> String {
  format!("1\tkaas\t\tkaas\t\tkees\tN1\t2\t\t\t{city}\t\t\t\t{comment}\tQ095p")
}

struct Env {
  _dir:    TempDir,
  input:   PathBuf,
  output:  PathBuf,
  catalog: Arc<SqliteStore>,
}

impl Env {
  async fn new() -> Self { Self::with(ResolverConfig::default()).await }

  async fn with(config: ResolverConfig) -> Self {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("csv");
    let output = dir.path().join("out");
    fs::create_dir_all(&input).unwrap();
    let catalog = Arc::new(SqliteStore::open_in_memory(config).await.unwrap());
    Self { _dir: dir, input, output, catalog }
  }

  async fn issue(&self, key: IssueKey) {
    self
      .catalog
      .register_issue(Issue {
        part:              key.part,
        section:           key.section,
        number:            key.number,
        title:             format!("Aflevering {}", key.number),
        year:              1995,
        authors:           "Goossens".into(),
        publication_place: "Assen".into(),
        visible:           true,
      })
      .await
      .unwrap();
  }

  /// Write `header` and `rows` to a file and register it under `key`.
  async fn source(&self, key: IssueKey, header: &str, rows: &[String]) {
    let name = format!("{}.tsv", key.file_stem());
    let mut text = format!("{header}\n");
    for row in rows {
      text.push_str(row);
      text.push('\n');
    }
    fs::write(self.input.join(&name), text).unwrap();
    self
      .catalog
      .register_source_file(key, name.into())
      .await
      .unwrap();
  }

  fn options(&self, method: Method) -> RunOptions {
    RunOptions {
      input_dir: self.input.clone(),
      output_dir: self.output.clone(),
      method,
      mines: MineRule::default(),
      progress_every: 1,
    }
  }

  async fn direct(&self, selection: Selection) -> Result<RunSummary, ImportError> {
    Controller::new(
      self.catalog.clone(),
      (*self.catalog).clone(),
      self.options(Method::Direct),
    )
    .run(selection)
    .await
  }

  async fn staged(&self, selection: Selection) -> Result<RunSummary, ImportError> {
    let store = StagingStore::new(
      self.catalog.snapshot().await.unwrap(),
      ResolverConfig::default(),
      &self.output,
    );
    Controller::new(self.catalog.clone(), store, self.options(Method::Staged))
      .run(selection)
      .await
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

#[test]
fn zero_coordinates_select_everything() {
  assert_eq!(Selection::from_coordinates(0, 0, 0, None), Selection::Everything);
  assert_eq!(
    Selection::from_coordinates(2, 0, 5, None),
    Selection::One { key: IssueKey::new(2, None, 5), file: None }
  );
  assert_eq!(
    Selection::from_coordinates(3, 1, 2, Some("x.tsv".into())),
    Selection::One { key: IssueKey::new(3, Some(1), 2), file: Some("x.tsv".into()) }
  );
}

// ─── Direct runs ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_lines_are_skipped_and_logged_verbatim() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 3);
  env.issue(key).await;
  let rejected = revised_row("kaas", "NULL", "kees", "Heerlen");
  env
    .source(key, REVISED_HEADER, &[
      revised_row("kaas", "kaas", "kees", "Heerlen"),
      rejected.clone(),
      revised_row("brood", "brood", "brööd", "Kerkrade"),
    ])
    .await;

  let summary = env.direct(Selection::Everything).await.unwrap();
  assert_eq!((summary.read(), summary.skipped()), (2, 1));
  assert_eq!(summary.files[0].reasons.get("line-2"), Some(&1));

  let skip = fs::read_to_string(env.output.join("fixture-d2-a3.skip")).unwrap();
  assert_eq!(skip, format!("{rejected}\n"));

  let status = env.catalog.get_status(summary.status).await.unwrap().unwrap();
  assert_eq!(status.status, "done");
  assert_eq!((status.read, status.skipped), (2, 1));

  let file = env.catalog.find_source_file(key).await.unwrap().unwrap();
  assert!(file.is_processed());
  assert_eq!((file.read, file.skipped), (2, 1));
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 2);
  assert_eq!(env.catalog.count(Model::Location).await.unwrap(), 2);
}

#[tokio::test]
async fn mine_file_rewrites_city_and_links_mines() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 5);
  env.issue(key).await;
  env
    .source(key, LEGACY_HEADER, &[legacy_row("Onbekend", "(I / Hendrik)")])
    .await;

  let summary = env.direct(Selection::from_coordinates(2, 0, 5, None)).await.unwrap();
  assert_eq!(summary.read(), 1);

  let snapshot = env.catalog.snapshot().await.unwrap();
  assert_eq!(snapshot.locations.len(), 1);
  assert_eq!(snapshot.locations[0].1.city, "Zie mijnen");
  assert_eq!(
    env.catalog.entry_mine_names(Pk(1)).await.unwrap(),
    vec!["Oranje-Nassau I", "Hendrik"]
  );
  assert_eq!(env.catalog.count(Model::EntryMine).await.unwrap(), 2);
}

#[tokio::test]
async fn other_files_get_no_mine_pass() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 4);
  env.issue(key).await;
  env
    .source(key, LEGACY_HEADER, &[legacy_row("Onbekend", "(I / Hendrik)")])
    .await;

  env.direct(Selection::Everything).await.unwrap();
  let snapshot = env.catalog.snapshot().await.unwrap();
  assert_eq!(snapshot.locations[0].1.city, "Onbekend");
  assert_eq!(env.catalog.count(Model::Mine).await.unwrap(), 0);
}

#[tokio::test]
async fn processed_files_are_not_imported_twice() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 3);
  env.issue(key).await;
  env
    .source(key, REVISED_HEADER, &[revised_row("kaas", "kaas", "kees", "Heerlen")])
    .await;

  env.direct(Selection::Everything).await.unwrap();
  let again = env.direct(Selection::Everything).await.unwrap();
  assert!(again.files.is_empty());
  assert_eq!(again.already_processed, 1);
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 1);
}

#[tokio::test]
async fn entries_continue_after_stored_ones() {
  let env = Env::new().await;
  let (first, second) = (IssueKey::new(2, None, 3), IssueKey::new(2, None, 4));
  env.issue(first).await;
  env.issue(second).await;
  let row = revised_row("kaas", "kaas", "kees", "Heerlen");
  env.source(first, REVISED_HEADER, &[row.clone(), row.clone()]).await;
  env.source(second, REVISED_HEADER, &[row]).await;

  env.direct(Selection::from_coordinates(2, 0, 3, None)).await.unwrap();
  env.direct(Selection::from_coordinates(2, 0, 4, None)).await.unwrap();
  assert!(env.catalog.get_entry(Pk(3)).await.unwrap().is_some());
}

#[tokio::test]
async fn identical_lines_give_separate_entries_unless_deduplicated() {
  let row = revised_row("kaas", "kaas", "kees", "Heerlen");
  let key = IssueKey::new(2, None, 3);

  let env = Env::new().await;
  env.issue(key).await;
  env.source(key, REVISED_HEADER, &[row.clone(), row.clone()]).await;
  let summary = env.direct(Selection::Everything).await.unwrap();
  assert_eq!(summary.files[0].duplicates, 0);
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 2);

  let env = Env::with(ResolverConfig { dedupe_entries: true, ..ResolverConfig::default() })
    .await;
  env.issue(key).await;
  env.source(key, REVISED_HEADER, &[row.clone(), row]).await;
  let summary = env.direct(Selection::Everything).await.unwrap();
  assert_eq!(summary.read(), 2);
  assert_eq!(summary.files[0].duplicates, 1);
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 1);
}

#[tokio::test]
async fn explicit_file_is_registered() {
  let env = Env::new().await;
  let key = IssueKey::new(3, Some(1), 2);
  env.issue(key).await;
  let path = env.input.join("elsewhere.tsv");
  fs::write(
    &path,
    format!("{REVISED_HEADER}\n{}\n", revised_row("kaas", "kaas", "kees", "Heerlen")),
  )
  .unwrap();

  let summary = env
    .direct(Selection::from_coordinates(3, 1, 2, Some(path.clone())))
    .await
    .unwrap();
  assert_eq!(summary.read(), 1);
  let file = env.catalog.find_source_file(key).await.unwrap().unwrap();
  assert_eq!(file.path, path);
  assert!(file.is_processed());
}

#[tokio::test]
async fn rerun_after_reset_adds_entries_unless_deduplicated() {
  let rows = [
    revised_row("kaas", "kaas", "kees", "Heerlen"),
    revised_row("brood", "brood", "brööd", "Kerkrade"),
  ];
  let key = IssueKey::new(2, None, 3);

  let env = Env::new().await;
  env.issue(key).await;
  env.source(key, REVISED_HEADER, &rows).await;
  env.direct(Selection::Everything).await.unwrap();
  assert_eq!(env.catalog.clear_processed(Some(key)).await.unwrap(), 1);
  let again = env.direct(Selection::Everything).await.unwrap();
  assert_eq!(again.files[0].duplicates, 0);
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 4);
  assert_eq!(env.catalog.count(Model::Headword).await.unwrap(), 2);

  let env = Env::with(ResolverConfig { dedupe_entries: true, ..ResolverConfig::default() })
    .await;
  env.issue(key).await;
  env.source(key, REVISED_HEADER, &rows).await;
  env.direct(Selection::Everything).await.unwrap();
  assert_eq!(env.catalog.clear_processed(Some(key)).await.unwrap(), 1);
  let again = env.direct(Selection::Everything).await.unwrap();
  assert_eq!(again.read(), 2);
  assert_eq!(again.files[0].duplicates, 2);
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 2);
}

#[tokio::test]
async fn zero_progress_interval_still_runs() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 3);
  env.issue(key).await;
  env
    .source(key, REVISED_HEADER, &[revised_row("kaas", "kaas", "kees", "Heerlen")])
    .await;

  let options = RunOptions { progress_every: 0, ..env.options(Method::Direct) };
  let summary = Controller::new(env.catalog.clone(), (*env.catalog).clone(), options)
    .run(Selection::Everything)
    .await
    .unwrap();
  assert_eq!(summary.read(), 1);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unregistered_issue_fails_the_run() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 3);
  env
    .source(key, REVISED_HEADER, &[revised_row("kaas", "kaas", "kees", "Heerlen")])
    .await;

  let status = env.catalog.create_status(Method::Direct).await.unwrap();
  let id = status.id;
  let result = Controller::new(
    env.catalog.clone(),
    (*env.catalog).clone(),
    env.options(Method::Direct),
  )
  .run_with_status(Selection::Everything, status)
  .await;
  assert!(matches!(result, Err(ImportError::IssueNotFound(k)) if k == key));

  let status = env.catalog.get_status(id).await.unwrap().unwrap();
  assert_eq!(status.status, "error");
  let file = env.catalog.find_source_file(key).await.unwrap().unwrap();
  assert!(!file.is_processed());
}

#[tokio::test]
async fn missing_input_fails_before_writing_anything() {
  let env = Env::new().await;
  let (present, absent) = (IssueKey::new(2, None, 3), IssueKey::new(2, None, 4));
  env.issue(present).await;
  env
    .source(present, REVISED_HEADER, &[revised_row("kaas", "kaas", "kees", "Heerlen")])
    .await;
  env
    .catalog
    .register_source_file(absent, "gone.tsv".into())
    .await
    .unwrap();

  let result = env.direct(Selection::Everything).await;
  assert!(matches!(result, Err(ImportError::MissingFile(p)) if p.ends_with("gone.tsv")));
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 0);
  assert!(!env.output.exists());
}

#[tokio::test]
async fn missing_explicit_file_keeps_the_registered_path() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 3);
  env.issue(key).await;
  env
    .source(key, REVISED_HEADER, &[revised_row("kaas", "kaas", "kees", "Heerlen")])
    .await;
  let registered = env.catalog.find_source_file(key).await.unwrap().unwrap().path;

  let result = env
    .direct(Selection::from_coordinates(2, 0, 3, Some("typo.tsv".into())))
    .await;
  assert!(matches!(result, Err(ImportError::MissingFile(p)) if p.ends_with("typo.tsv")));

  let file = env.catalog.find_source_file(key).await.unwrap().unwrap();
  assert_eq!(file.path, registered);
  assert!(!file.is_processed());

  let summary = env.direct(Selection::Everything).await.unwrap();
  assert_eq!(summary.read(), 1);
}

#[tokio::test]
async fn unknown_selection_is_an_error() {
  let env = Env::new().await;
  let result = env.direct(Selection::from_coordinates(9, 0, 9, None)).await;
  assert!(matches!(result, Err(ImportError::UnknownFile(_))));
}

#[tokio::test]
async fn unknown_header_fails_the_file() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 3);
  env.issue(key).await;
  env.source(key, "Lemma\tTitel", &["kaas\tkees".to_owned()]).await;

  let result = env.direct(Selection::Everything).await;
  assert!(matches!(
    result,
    Err(ImportError::Source(wld_tsv::Error::UnknownSchema(_)))
  ));
}

// ─── Staged runs ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn staged_run_writes_fixture_and_leaves_store_untouched() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 5);
  env.issue(key).await;
  env
    .source(key, LEGACY_HEADER, &[legacy_row("Onbekend", "(II)"), legacy_row("Heerlen", "")])
    .await;

  let summary = env.staged(Selection::Everything).await.unwrap();
  assert_eq!(summary.method, Method::Staged);
  assert_eq!(summary.read(), 2);
  assert_eq!(env.catalog.count(Model::Entry).await.unwrap(), 0);
  assert_eq!(env.catalog.count(Model::Location).await.unwrap(), 0);

  let text = fs::read_to_string(env.output.join("fixture-d2-a5.json")).unwrap();
  let records: Vec<Value> = serde_json::from_str(&text).unwrap();
  let models: Vec<&str> = records
    .iter()
    .map(|r| r["model"].as_str().unwrap())
    .collect();
  assert_eq!(models.iter().filter(|m| **m == "dictionary.entry").count(), 2);
  assert_eq!(models.iter().filter(|m| **m == "dictionary.location").count(), 2);
  assert!(models.contains(&"dictionary.entrymine"));
  assert!(!models.contains(&"dictionary.issue"));

  let mine = records
    .iter()
    .find(|r| r["model"] == "dictionary.mine")
    .unwrap();
  assert_eq!(mine["fields"]["name"], "Oranje-Nassau II");

  let file = env.catalog.find_source_file(key).await.unwrap().unwrap();
  assert!(file.is_processed());
}

#[tokio::test]
async fn staged_reruns_are_byte_identical() {
  let env = Env::new().await;
  let key = IssueKey::new(2, None, 3);
  env.issue(key).await;
  env
    .source(key, REVISED_HEADER, &[
      revised_row("kaas", "kaas", "kees", "Heerlen"),
      revised_row("kaas", "kaas", "kies", "Kerkrade"),
      revised_row("brood", "NULL", "brood", "Heerlen"),
    ])
    .await;
  let fixture = env.output.join("fixture-d2-a3.json");

  env.staged(Selection::Everything).await.unwrap();
  let first = fs::read(&fixture).unwrap();

  assert_eq!(env.catalog.clear_processed(Some(key)).await.unwrap(), 1);
  env.staged(Selection::Everything).await.unwrap();
  let second = fs::read(&fixture).unwrap();

  assert_eq!(first, second);
}
