//! The `Catalog` trait: durable administrative records an import run reads
//! and updates besides the resolved entities themselves.

use std::{future::Future, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  key::IssueKey,
  model::{Issue, Location, Mine, Pk},
  status::{Method, RunStatus},
};

/// A registered source file and its processing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
  pub id:        Pk,
  pub key:       IssueKey,
  pub path:      PathBuf,
  /// Set once the file has been scanned to the end. A file with a timestamp
  /// is never scanned again.
  pub processed: Option<DateTime<Utc>>,
  pub read:      u64,
  pub skipped:   u64,
}

impl SourceFile {
  pub fn is_processed(&self) -> bool { self.processed.is_some() }
}

/// Durable records copied into a staging store at the start of a run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  pub locations:  Vec<(Pk, Location)>,
  pub issues:     Vec<(Pk, Issue)>,
  pub mines:      Vec<(Pk, Mine)>,
  /// Highest stored entry identity, so staged entries continue after it.
  pub last_entry: Pk,
}

/// Abstraction over the durable catalog.
///
/// Unlike [`crate::store::IdentityStore`], a catalog is shared: the controller
/// writes run status through one handle while a poller reads it through
/// another.
pub trait Catalog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Source files ──────────────────────────────────────────────────────

  /// All registered source files, in registration order.
  fn source_files(
    &self,
  ) -> impl Future<Output = Result<Vec<SourceFile>, Self::Error>> + Send + '_;

  fn find_source_file(
    &self,
    key: IssueKey,
  ) -> impl Future<Output = Result<Option<SourceFile>, Self::Error>> + Send + '_;

  /// Register the raw file for `key`, or point an existing registration at
  /// `path`. Processing state is left as it was.
  fn register_source_file(
    &self,
    key: IssueKey,
    path: PathBuf,
  ) -> impl Future<Output = Result<SourceFile, Self::Error>> + Send + '_;

  /// Record the final counts and the processed timestamp in one write.
  fn mark_processed(
    &self,
    id: Pk,
    read: u64,
    skipped: u64,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Run status ────────────────────────────────────────────────────────

  fn create_status(
    &self,
    method: Method,
  ) -> impl Future<Output = Result<RunStatus, Self::Error>> + Send + '_;

  /// Persist every field of `status` as a single write.
  fn save_status(
    &self,
    status: RunStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_status(
    &self,
    id: Pk,
  ) -> impl Future<Output = Result<Option<RunStatus>, Self::Error>> + Send + '_;

  // ── Seeding ───────────────────────────────────────────────────────────

  /// Current locations, issues and mines in identity order, plus the
  /// highest entry identity.
  fn snapshot(
    &self,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_;
}
