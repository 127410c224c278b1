//! The `IdentityStore` trait: get-or-create resolution of raw key values to
//! stable identities.
//!
//! Two back-ends implement it: the persistent store (`wld-store-sqlite`) and
//! the run-scoped staging store (`wld-fixture`). The import controller depends
//! only on this abstraction. The two back-ends are never mixed within a run;
//! their identities are not comparable.

use std::future::Future;

use crate::{
  key::{
    DescriptionKey, HeadwordKey, IssueKey, KeywordKey, LocationKey, MineKey,
  },
  model::{Entry, Pk},
};

// ─── Record groups ───────────────────────────────────────────────────────────

/// The keys of one input line that resolve as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKeys {
  pub headword:    HeadwordKey,
  pub description: DescriptionKey,
  pub location:    LocationKey,
  pub keyword:     KeywordKey,
}

/// The identities a [`GroupKeys`] resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRefs {
  pub headword:             Pk,
  pub description:          Pk,
  pub headword_description: Pk,
  pub location:             Pk,
  pub keyword:              Pk,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an identity back-end.
///
/// Every `resolve_*` call looks up an existing record by its key tuple and
/// returns its identity, or creates the record and returns the new identity.
/// For one store instance, two calls with equal keys always return the same
/// identity and create at most one record between them.
///
/// Methods take `&mut self`: a store belongs to exactly one run and sees its
/// lines one at a time.
pub trait IdentityStore: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Get-or-create resolvers ───────────────────────────────────────────

  fn resolve_headword(
    &mut self,
    key: HeadwordKey,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  /// When several stored descriptions match, the first in stored order wins.
  fn resolve_description(
    &mut self,
    key: DescriptionKey,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  fn resolve_headword_description(
    &mut self,
    headword: Pk,
    description: Pk,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  fn resolve_location(
    &mut self,
    key: LocationKey,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  /// Matches according to [`crate::key::ResolverConfig::keyword_match`].
  fn resolve_keyword(
    &mut self,
    key: KeywordKey,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  fn resolve_mine(
    &mut self,
    key: MineKey,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  fn resolve_entry_mine(
    &mut self,
    entry: Pk,
    mine: Pk,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  // ── Lookup only ───────────────────────────────────────────────────────

  /// Issues are registered administratively; this never creates one.
  fn find_issue(
    &mut self,
    key: IssueKey,
  ) -> impl Future<Output = Result<Option<Pk>, Self::Error>> + Send + '_;

  // ── Entries ───────────────────────────────────────────────────────────

  /// The highest entry identity already in use, or `Pk(0)`.
  fn last_entry_pk(
    &mut self,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  /// Store `entry` under the caller-assigned identity `pk` and return it.
  ///
  /// With [`crate::key::ResolverConfig::dedupe_entries`] set, an equal
  /// existing entry's identity is returned instead and nothing is written.
  fn record_entry(
    &mut self,
    pk: Pk,
    entry: Entry,
  ) -> impl Future<Output = Result<Pk, Self::Error>> + Send + '_;

  // ── Grouping ──────────────────────────────────────────────────────────

  /// Resolve headword → description → join → location → keyword for one
  /// line. Back-ends with transactions override this to make the group
  /// atomic.
  fn resolve_group(
    &mut self,
    keys: GroupKeys,
  ) -> impl Future<Output = Result<GroupRefs, Self::Error>> + Send + '_ {
    async move {
      let headword = self.resolve_headword(keys.headword).await?;
      let description = self.resolve_description(keys.description).await?;
      let headword_description = self
        .resolve_headword_description(headword, description)
        .await?;
      let location = self.resolve_location(keys.location).await?;
      let keyword = self.resolve_keyword(keys.keyword).await?;
      Ok(GroupRefs {
        headword,
        description,
        headword_description,
        location,
        keyword,
      })
    }
  }

  // ── File boundaries ───────────────────────────────────────────────────

  /// Called before the first line of a source file is resolved.
  fn begin_file(
    &mut self,
    _key: IssueKey,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    std::future::ready(Ok(()))
  }

  /// Called after the last line of a source file, on success only.
  fn finish_file(
    &mut self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_ {
    std::future::ready(Ok(()))
  }
}
