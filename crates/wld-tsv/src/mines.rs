//! Mine-list extraction for the one publication that records workplaces.
//!
//! The annotation looks like `"(I / II / Hendrik)"`. Bare Roman numerals are
//! short for the mines of one company (`I` → `"Oranje-Nassau I"`), and the
//! range `"Oranje-Nassau I-IV"` stands for all four of them.

use serde::{Deserialize, Serialize};
use wld_core::key::{IssueKey, same};

use crate::schema::Line;

const NUMERALS: [&str; 4] = ["I", "II", "III", "IV"];

/// Which file carries mines and how to expand their short forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MineRule {
  /// Part number of the mine-bearing publication.
  pub part:             u32,
  /// Issue number of the mine-bearing publication.
  pub issue:            u32,
  /// Company name the Roman-numeral short forms expand to.
  pub base_name:        String,
  /// City value meaning "location unknown", compared case-insensitively.
  pub unknown_city:     String,
  /// City value substituted for the unknown-location sentinel.
  pub placeholder_city: String,
}

impl Default for MineRule {
  fn default() -> Self {
    Self {
      part:             2,
      issue:            5,
      base_name:        "Oranje-Nassau".to_owned(),
      unknown_city:     "onbekend".to_owned(),
      placeholder_city: "Zie mijnen".to_owned(),
    }
  }
}

impl MineRule {
  /// Whether files with these coordinates get the mine pass. The section
  /// plays no part.
  pub fn applies_to(&self, key: &IssueKey) -> bool {
    key.part == self.part && key.number == self.issue
  }

  /// Split an annotation into full mine names. Empty input yields an empty
  /// list; empty tokens are dropped.
  pub fn extract(&self, annotation: &str) -> Vec<String> {
    let bare = annotation.replace(['(', ')'], "");
    let bare = bare.trim();
    if bare.is_empty() {
      return Vec::new();
    }

    let range = format!("{} I-IV", self.base_name);
    let expanded_range = NUMERALS
      .iter()
      .map(|n| format!("{} {n}", self.base_name))
      .collect::<Vec<_>>()
      .join(" / ");
    let bare = bare.replace(&range, &expanded_range);

    bare
      .split('/')
      .map(str::trim)
      .filter(|token| !token.is_empty())
      .map(|token| {
        if NUMERALS.contains(&token) {
          format!("{} {token}", self.base_name)
        } else {
          token.to_owned()
        }
      })
      .collect()
  }

  /// Replace the unknown-location city and fill `line.mines`.
  pub fn apply(&self, line: &mut Line) {
    if same(&line.location_city, &self.unknown_city) {
      line.location_city = self.placeholder_city.clone();
    }
    line.mines = self.extract(&line.mine_annotation);
  }
}
