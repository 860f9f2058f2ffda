//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Answer, Challenge, JsonRow};
use crate::engine::TableSnapshot;
use crate::highlight::{classify, TokenKind};
use crate::navigation::NavigationIndex;
use crate::validate::Verdict;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// (Re)start the session at a deep-link token such as `challenge=3`.
    Start {
        #[serde(default)]
        hash: Option<String>,
    },
    Previous,
    Next,
    Jump {
        index: usize,
    },
    Run {
        sql: String,
    },
    Highlight {
        sql: String,
    },
    /// Rebuild the current challenge database, dropping the learner's changes.
    Reset,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Challenge { challenge: ChallengeView },
    Verdict { verdict: Verdict },
    Highlight { spans: Vec<SpanOut> },
    Error { message: String },
}

/// One highlighted span with the class the front end styles it with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanOut {
    pub kind: TokenKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<&'static str>,
    pub text: String,
}

pub fn spans_out(sql: &str) -> Vec<SpanOut> {
    classify(sql)
        .into_iter()
        .map(|s| SpanOut { kind: s.kind, class: s.kind.css_class(), text: s.text })
        .collect()
}

/// Where the displayed challenge sits in the traversal order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavState {
    pub logical: usize,
    pub total: usize,
    pub has_previous: bool,
    pub has_next: bool,
    /// Deep-link token to put in the URL fragment.
    pub hash: String,
}

impl NavState {
    pub fn of(nav: &NavigationIndex) -> Self {
        Self {
            logical: nav.current_logical().unwrap_or(0),
            total: nav.len(),
            has_previous: nav.has_previous(),
            has_next: nav.has_next(),
            hash: nav.deep_link(),
        }
    }
}

/// Everything the front end needs to paint one challenge.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeView {
    pub index: usize,
    pub title: String,
    pub level: String,
    pub level_class: String,
    pub description: String,
    pub tables: Vec<TableSnapshot>,
    pub answer: Option<AnswerView>,
    pub navigation: NavState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub explanation: String,
    pub steps: Vec<StepView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub example_tables: Vec<MiniTable>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub spans: Vec<SpanOut>,
    pub description: String,
    pub is_final: bool,
}

/// "Before"/"After" example table. Columns come from the first row's keys.
#[derive(Debug, Clone, Serialize)]
pub struct MiniTable {
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub empty: bool,
}

fn mini_table(label: &str, data: &[JsonRow]) -> MiniTable {
    let columns: Vec<String> = data.first().map(|r| r.keys().cloned().collect()).unwrap_or_default();
    let rows = data
        .iter()
        .map(|r| columns.iter().map(|c| r.get(c).cloned().unwrap_or(Value::Null)).collect())
        .collect();
    MiniTable { label: format!("{label} Table"), columns, rows, empty: data.is_empty() }
}

pub fn answer_view(answer: &Answer) -> AnswerView {
    let steps = answer
        .steps
        .iter()
        .map(|s| StepView { spans: spans_out(&s.sql), description: s.description.clone(), is_final: s.is_final })
        .collect();
    let example_tables = answer
        .example_table
        .as_ref()
        .map(|t| vec![mini_table("Before", &t.before), mini_table("After", &t.after)])
        .unwrap_or_default();
    AnswerView { explanation: answer.explanation.clone(), steps, example_tables }
}

/// Convert a catalogue entry plus its live tables into the public view.
pub fn challenge_view(c: &Challenge, nav: &NavigationIndex, tables: Vec<TableSnapshot>) -> ChallengeView {
    ChallengeView {
        index: nav.current(),
        title: c.title.clone(),
        level: c.level_label().to_string(),
        level_class: c.level_class(),
        description: c.description.clone(),
        tables,
        answer: c.answer.as_ref().map(answer_view),
        navigation: NavState::of(nav),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    /// Deep-link token, e.g. `challenge=2`. Ignored when `index` is given.
    pub hash: Option<String>,
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RunIn {
    #[serde(rename = "challengeIndex")]
    pub challenge_index: usize,
    pub sql: String,
}

#[derive(Debug, Deserialize)]
pub struct HighlightIn {
    pub sql: String,
}
#[derive(Serialize)]
pub struct HighlightOut {
    pub spans: Vec<SpanOut>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub challenges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnswerStep, ExampleTable};
    use serde_json::json;

    fn row(v: Value) -> JsonRow {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn answer_view_highlights_steps_and_builds_tables() {
        let answer = Answer {
            explanation: "Filter, then count.".into(),
            steps: vec![AnswerStep { sql: "SELECT COUNT(*) FROM t".into(), description: String::new(), is_final: true }],
            example_table: Some(ExampleTable {
                before: vec![],
                after: vec![row(json!({"id": 1, "name": "Ann"})), row(json!({"name": "Bob"}))],
            }),
        };
        let view = answer_view(&answer);
        assert!(view.steps[0].is_final);
        let classes: Vec<_> = view.steps[0].spans.iter().map(|s| s.class).collect();
        assert_eq!(classes, vec![Some("sql-keyword"), None, Some("sql-function"), None, Some("sql-keyword"), None]);

        let before = &view.example_tables[0];
        assert_eq!(before.label, "Before Table");
        assert!(before.empty);
        let after = &view.example_tables[1];
        assert_eq!(after.columns, vec!["id", "name"]);
        assert_eq!(after.rows[1], vec![Value::Null, json!("Bob")]);
    }

    #[test]
    fn ws_messages_use_tagged_json() {
        let msg: ClientWsMessage = serde_json::from_str(r#"{"type":"jump","index":3}"#).expect("jump");
        assert!(matches!(msg, ClientWsMessage::Jump { index: 3 }));
        let msg: ClientWsMessage = serde_json::from_str(r#"{"type":"start"}"#).expect("start");
        assert!(matches!(msg, ClientWsMessage::Start { hash: None }));

        let out = serde_json::to_value(ServerWsMessage::Highlight { spans: spans_out("a = 1") }).expect("json");
        assert_eq!(out["type"], "highlight");
        assert_eq!(out["spans"][1]["kind"], "operator");
        assert_eq!(out["spans"][1]["class"], "sql-operator");
        assert!(out["spans"][0].get("class").is_none());
    }
}
