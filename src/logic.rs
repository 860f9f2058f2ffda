//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Opening a session from a deep-link token or an explicit index
//!   - Grading a submitted query
//!   - Highlighting SQL for display

use tracing::{debug, instrument};

use crate::protocol::{spans_out, ChallengeView, SpanOut};
use crate::session::Session;
use crate::state::AppState;
use crate::validate::Verdict;

/// Session for a one-off request. An explicit index wins over the hash; `None` when the
/// index is out of range.
#[instrument(level = "info", skip(state))]
pub fn open_session(state: &AppState, hash: Option<&str>, index: Option<usize>) -> Option<Session> {
  match index {
    Some(i) => Session::at_index(state, i),
    None => Some(Session::start(state, hash)),
  }
}

pub fn challenge_for(state: &AppState, hash: Option<&str>, index: Option<usize>) -> Option<ChallengeView> {
  open_session(state, hash, index).map(|mut s| s.view())
}

/// Grades `sql` against a fresh copy of the challenge database.
#[instrument(level = "info", skip(state, sql), fields(sql_len = sql.len()))]
pub fn run_once(state: &AppState, index: usize, sql: &str) -> Option<Verdict> {
  Session::at_index(state, index).map(|mut s| s.run(sql))
}

#[instrument(level = "debug", skip(sql), fields(sql_len = sql.len()))]
pub fn highlight(sql: &str) -> Vec<SpanOut> {
  let spans = spans_out(sql);
  debug!(target: "sql_trainer", spans = spans.len(), "SQL highlighted");
  spans
}
