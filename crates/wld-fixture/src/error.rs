//! Error type for `wld-fixture`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A record was staged before `begin_file` opened a fixture document.
  #[error("no fixture file is open")]
  NoOpenFile,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
