//! Error types for the survey-file codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("source file has no header line")]
  MissingHeader,

  #[error("unknown column layout {0:?}; expected \"Lemmanummer\" or \"lemma.name\"")]
  UnknownSchema(String),

  #[error("read error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
