//! Domain models: a SQL challenge, its worked answer, and the level helpers used for grouping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Group used for challenges without a level (or with an empty one).
pub const UNSPECIFIED_LEVEL: &str = "Unspecified";

/// One row of an example table, keyed by column name.
pub type JsonRow = Map<String, Value>;

/// A challenge as found in the catalogue JSON. Read-only once loaded.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
  pub title: String,
  #[serde(default)] pub level: Option<String>,
  #[serde(default)] pub description: String,
  /// SQL script that creates and fills the challenge tables.
  #[serde(default)] pub schema: String,
  /// Expected rows as `[{column: value}]`, compared verbatim (column and row order matter).
  #[serde(default)] pub expected_result: Value,
  #[serde(default)] pub answer: Option<Answer>,
}

impl Challenge {
  /// Level name used for grouping and for the badge.
  pub fn level_label(&self) -> &str {
    match self.level.as_deref() {
      Some(l) if !l.is_empty() => l,
      _ => UNSPECIFIED_LEVEL,
    }
  }

  /// CSS class of the level badge ("beginner", "unspecified", ...).
  pub fn level_class(&self) -> String {
    self.level_label().to_lowercase()
  }
}

/// Worked solution shown after the learner asks for it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
  #[serde(default)] pub explanation: String,
  #[serde(default)] pub steps: Vec<AnswerStep>,
  #[serde(default)] pub example_table: Option<ExampleTable>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnswerStep {
  pub sql: String,
  #[serde(default)] pub description: String,
  /// Marks the step holding the complete query.
  #[serde(default, rename = "final")] pub is_final: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExampleTable {
  #[serde(default)] pub before: Vec<JsonRow>,
  #[serde(default)] pub after: Vec<JsonRow>,
}
