//! Error type for `wld-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] wld_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An issue with the same coordinates is already registered.
  #[error("issue {0} is already registered")]
  DuplicateIssue(wld_core::key::IssueKey),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
