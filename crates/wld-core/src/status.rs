//! Run status: the externally pollable progress record of an import run.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{key::IssueKey, model::Pk};

/// How resolved records reach durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
  /// Resolve and write straight into the persistent store.
  #[default]
  Direct,
  /// Resolve against run-local tables and emit a fixture for a later bulk load.
  Staged,
}

impl Method {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Direct => "direct",
      Self::Staged => "staged",
    }
  }
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Method {
  type Err = crate::Error;

  fn from_str(s: &str) -> crate::Result<Self> {
    match s {
      "direct" => Ok(Self::Direct),
      "staged" => Ok(Self::Staged),
      other => Err(crate::Error::UnknownMethod(other.to_owned())),
    }
  }
}

/// Controller state. `Idle → Preparing → Working(file)* → Done | Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Preparing,
  Working(IssueKey),
  Done,
  Error,
}

impl Phase {
  /// The free-text label stored in [`RunStatus::status`].
  pub fn label(&self) -> String {
    match self {
      Self::Idle => "idle".to_owned(),
      Self::Preparing => "preparing".to_owned(),
      Self::Working(key) => format!("working {key}"),
      Self::Done => "done".to_owned(),
      Self::Error => "error".to_owned(),
    }
  }
}

/// The progress record a concurrent reader may poll at any time. Each save is
/// a single write, so readers never observe a torn record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
  pub id:      Pk,
  pub read:    u64,
  pub skipped: u64,
  pub status:  String,
  pub method:  Method,
}

impl RunStatus {
  pub fn new(id: Pk, method: Method) -> Self {
    Self {
      id,
      read: 0,
      skipped: 0,
      status: Phase::Idle.label(),
      method,
    }
  }

  pub fn set_phase(&mut self, phase: Phase) { self.status = phase.label(); }
}
