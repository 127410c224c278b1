//! Error type for import runs.

use std::path::PathBuf;

use thiserror::Error;
use wld_core::key::IssueKey;

/// Anything that aborts a run. Rejected lines are not errors; they are
/// counted and logged.
#[derive(Debug, Error)]
pub enum ImportError {
  #[error("source file: {0}")]
  Source(#[from] wld_tsv::Error),

  #[error("issue {0} is not registered")]
  IssueNotFound(IssueKey),

  #[error("no source file is registered for {0}")]
  UnknownFile(IssueKey),

  #[error("input file not found: {}", .0.display())]
  MissingFile(PathBuf),

  #[error("output: {0}")]
  Output(#[from] wld_fixture::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

impl ImportError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
