//! Checking a learner's query against the challenge's expected rows.
//!
//! Rows are projected into `{column: value}` objects and both sides are
//! serialized before comparing, so column order and row order both matter.
//!
//! Before serializing, both sides go through `canonical`, which gives them the
//! shape a browser holds after `JSON.parse`: whole numbers are integers (`7.0`
//! and `7` agree) and keys that look like array indices (`"2023"`) come first
//! in ascending order, ahead of the other keys in insertion order.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::engine::{real_to_json, QueryEngine, ResultSet};

pub const NO_RESULTS: &str = "No results.";
const SUCCESS: &str = "Correct! Your result matches the expected output.";
const MISMATCH: &str = "Not quite. Your result does not match the expected output.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Success,
  Mismatch,
  ExecutionError,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Verdict {
  pub outcome: Outcome,
  pub message: String,
  /// What the query returned, for display. Absent on errors and empty results.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<ResultSet>,
}

impl Verdict {
  pub fn execution_error(message: impl Into<String>) -> Self {
    Self { outcome: Outcome::ExecutionError, message: message.into(), result: None }
  }
}

/// `[{column: value}]` per row, columns in query order. A repeated column name keeps its
/// first position and its last value.
pub fn project_rows(rs: &ResultSet) -> Vec<Map<String, Value>> {
  rs.rows
    .iter()
    .map(|row| rs.columns.iter().cloned().zip(row.iter().cloned()).collect())
    .collect()
}

pub fn rows_match(rows: &[Map<String, Value>], expected: &Value) -> bool {
  let got = canonical(&Value::Array(rows.iter().cloned().map(Value::Object).collect()));
  match (serde_json::to_string(&got), serde_json::to_string(&canonical(expected))) {
    (Ok(got), Ok(want)) => got == want,
    _ => false,
  }
}

pub fn canonical(value: &Value) -> Value {
  match value {
    Value::Number(n) if n.is_f64() => n.as_f64().map_or(Value::Null, real_to_json),
    Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
    Value::Object(map) => {
      let (mut indexed, named): (Vec<_>, Vec<_>) = map.iter().partition(|(k, _)| array_index(k).is_some());
      indexed.sort_by_key(|(k, _)| array_index(k));
      Value::Object(indexed.into_iter().chain(named).map(|(k, v)| (k.clone(), canonical(v))).collect())
    }
    other => other.clone(),
  }
}

/// `Some(n)` when `key` is the canonical decimal form of an array index (0 ..= 2^32 - 2).
fn array_index(key: &str) -> Option<u32> {
  key.parse::<u32>().ok().filter(|&n| n != u32::MAX && n.to_string() == key)
}

/// Runs the learner's SQL and grades the first result set.
pub fn evaluate(engine: &mut impl QueryEngine, sql: &str, expected: &Value) -> Verdict {
  match engine.execute(sql) {
    Err(e) => Verdict::execution_error(e.message),
    Ok(None) => Verdict { outcome: Outcome::Mismatch, message: NO_RESULTS.into(), result: None },
    Ok(Some(rs)) => {
      let outcome = if rows_match(&project_rows(&rs), expected) { Outcome::Success } else { Outcome::Mismatch };
      let message = match outcome {
        Outcome::Success => SUCCESS,
        _ => MISMATCH,
      };
      Verdict { outcome, message: message.into(), result: Some(rs) }
    }
  }
}
