//! Runtime configuration, layered from a TOML file and `WLD_*` variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use wld_core::{
  key::{KeywordMatch, ResolverConfig},
  status::Method,
};
use wld_tsv::MineRule;

/// Everything an import run or the status server needs to start.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
  /// SQLite database file.
  pub store_path:     PathBuf,
  /// Base directory for relative source-file paths.
  pub input_dir:      PathBuf,
  /// Where fixture documents and skip logs are written.
  pub output_dir:     PathBuf,
  pub method:         Method,
  pub keyword_match:  KeywordMatch,
  pub dedupe_entries: bool,
  /// Lines between two status writes.
  pub progress_every: u64,
  /// Listen address for the status endpoint, e.g. `127.0.0.1:8040`.
  pub status_addr:    Option<String>,
  pub mines:          MineRule,
}

impl Default for ImportConfig {
  fn default() -> Self {
    Self {
      store_path:     PathBuf::from("wld.sqlite3"),
      input_dir:      PathBuf::from("csv_files"),
      output_dir:     PathBuf::from("fixtures"),
      method:         Method::default(),
      keyword_match:  KeywordMatch::default(),
      dedupe_entries: false,
      progress_every: 1,
      status_addr:    None,
      mines:          MineRule::default(),
    }
  }
}

impl ImportConfig {
  /// Read `path` if it exists, then apply `WLD_*` environment overrides.
  /// Nested keys use a double underscore: `WLD_MINES__BASE_NAME`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("WLD")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn resolver(&self) -> ResolverConfig {
    ResolverConfig {
      keyword_match:  self.keyword_match,
      dedupe_entries: self.dedupe_entries,
    }
  }
}
