//! Error types for `wld-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown method: {0:?}")]
  UnknownMethod(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
