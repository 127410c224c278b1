//! Append-only staging table.

use wld_core::model::Pk;

/// Rows of one entity type, owned by a single staging store for one run.
#[derive(Debug, Clone)]
pub struct Table<T> {
  rows: Vec<(Pk, T)>,
}

impl<T> Default for Table<T> {
  fn default() -> Self { Self { rows: Vec::new() } }
}

impl<T> Table<T> {
  pub fn seeded(rows: Vec<(Pk, T)>) -> Self { Self { rows } }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Newest-first scan; returns the identity of the first row `pred` accepts.
  pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Pk> {
    self
      .rows
      .iter()
      .rev()
      .find(|(_, row)| pred(row))
      .map(|(pk, _)| *pk)
  }

  /// Highest identity in the table, or `Pk(0)` when empty.
  pub fn last_pk(&self) -> Pk {
    self.rows.iter().map(|(pk, _)| *pk).max().unwrap_or_default()
  }

  /// One past the table size, bumped past any seeded identity it would
  /// collide with.
  pub fn next_pk(&self) -> Pk {
    let by_size = Pk(i64::try_from(self.rows.len()).unwrap_or(i64::MAX));
    by_size.max(self.last_pk()).next()
  }

  pub fn push(&mut self, pk: Pk, row: T) { self.rows.push((pk, row)); }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn next_pk_follows_size() {
    let mut t = Table::default();
    assert_eq!(t.next_pk(), Pk(1));
    t.push(Pk(1), "a");
    t.push(Pk(2), "b");
    assert_eq!(t.next_pk(), Pk(3));
  }

  #[test]
  fn next_pk_skips_past_seeded_gaps() {
    let t = Table::seeded(vec![(Pk(4), "a"), (Pk(9), "b")]);
    assert_eq!(t.next_pk(), Pk(10));
  }

  #[test]
  fn find_prefers_newest_row() {
    let t = Table::seeded(vec![(Pk(1), "kaas"), (Pk(2), "kaas"), (Pk(3), "brood")]);
    assert_eq!(t.find(|r| *r == "kaas"), Some(Pk(2)));
    assert_eq!(t.find(|r| *r == "melk"), None);
  }
}
