//! One learner's session: the navigation position plus the database of the
//! challenge on display. A session is owned by exactly one connection (or one
//! HTTP request), so it needs no locking.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::Challenge;
use crate::engine::{ExecutionError, QueryLimits, SqliteEngine};
use crate::navigation::NavigationIndex;
use crate::protocol::{challenge_view, ChallengeView};
use crate::state::AppState;
use crate::util::trunc_for_log;
use crate::validate::{evaluate, Verdict};

pub struct Session {
  pub id: Uuid,
  challenges: Arc<Vec<Challenge>>,
  nav: NavigationIndex,
  limits: QueryLimits,
  engine: Result<SqliteEngine, ExecutionError>,
}

impl Session {
  /// New session positioned by a deep-link token (first catalogue entry when absent or invalid).
  pub fn start(state: &AppState, hash: Option<&str>) -> Self {
    let mut nav = state.navigation.clone();
    nav.jump_to(crate::navigation::resolve_deep_link(hash, state.challenges.len()));
    Self::with_navigation(state, nav)
  }

  /// New session on an explicit original index. `None` when the index is out of range.
  pub fn at_index(state: &AppState, index: usize) -> Option<Self> {
    let mut nav = state.navigation.clone();
    nav.jump_to(index).then(|| Self::with_navigation(state, nav))
  }

  fn with_navigation(state: &AppState, nav: NavigationIndex) -> Self {
    let engine = open_engine(&state.challenges[nav.current()], state.limits);
    let session = Self { id: Uuid::new_v4(), challenges: state.challenges.clone(), nav, limits: state.limits, engine };
    info!(target: "challenge", session = %session.id, index = session.nav.current(), "Session started");
    session
  }

  pub fn current(&self) -> &Challenge {
    &self.challenges[self.nav.current()]
  }

  pub fn navigation(&self) -> &NavigationIndex {
    &self.nav
  }

  pub fn previous(&mut self) -> bool {
    let moved = self.nav.go_previous();
    if moved {
      self.reload();
    }
    moved
  }

  pub fn next(&mut self) -> bool {
    let moved = self.nav.go_next();
    if moved {
      self.reload();
    }
    moved
  }

  /// Selecting a challenge always reloads it, even when it is already on display.
  pub fn jump(&mut self, index: usize) -> bool {
    let moved = self.nav.jump_to(index);
    if moved {
      self.reload();
    }
    moved
  }

  /// Fresh database for the current challenge.
  #[instrument(level = "debug", skip(self), fields(session = %self.id, index = self.nav.current()))]
  pub fn reload(&mut self) {
    self.engine = open_engine(self.current(), self.limits);
  }

  #[instrument(level = "info", skip(self, sql), fields(session = %self.id, index = self.nav.current(), sql = %trunc_for_log(sql, 120)))]
  pub fn run(&mut self, sql: &str) -> Verdict {
    let index = self.nav.current();
    let expected = &self.challenges[index].expected_result;
    let verdict = match &mut self.engine {
      Ok(engine) => evaluate(engine, sql, expected),
      Err(e) => Verdict::execution_error(format!("Challenge database unavailable: {e}")),
    };
    info!(target: "challenge", session = %self.id, index, outcome = ?verdict.outcome, "Query evaluated");
    verdict
  }

  /// Current challenge with its live tables.
  pub fn view(&mut self) -> ChallengeView {
    let tables = match &mut self.engine {
      Ok(engine) => engine.tables().unwrap_or_else(|e| {
        warn!(target: "challenge", session = %self.id, error = %e, "Could not list tables");
        Vec::new()
      }),
      Err(_) => Vec::new(),
    };
    challenge_view(self.current(), &self.nav, tables)
  }
}

fn open_engine(challenge: &Challenge, limits: QueryLimits) -> Result<SqliteEngine, ExecutionError> {
  SqliteEngine::open(&challenge.schema, limits).map_err(|e| {
    warn!(target: "challenge", title = %challenge.title, error = %e, "Challenge schema failed to load");
    e
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::validate::Outcome;
  use serde_json::json;

  fn state() -> AppState {
    let challenges = vec![
      Challenge {
        title: "Count people".into(),
        level: Some("Intermediate".into()),
        schema: "CREATE TABLE p (name TEXT); INSERT INTO p VALUES ('a'), ('b');".into(),
        expected_result: json!([{"n": 2}]),
        ..Default::default()
      },
      Challenge {
        title: "List people".into(),
        level: Some("Beginner".into()),
        schema: "CREATE TABLE p (name TEXT); INSERT INTO p VALUES ('a');".into(),
        expected_result: json!([{"name": "a"}]),
        ..Default::default()
      },
      Challenge { title: "Broken".into(), level: Some("Advanced".into()), schema: "CREATE TABLE (".into(), ..Default::default() },
    ];
    AppState::from_challenges(challenges).expect("state")
  }

  #[test]
  fn starts_from_hash_and_walks_the_order() {
    let state = state();
    let mut s = Session::start(&state, Some("challenge=1"));
    assert_eq!(s.current().title, "List people");
    assert!(!s.previous());
    assert!(s.next());
    assert_eq!(s.current().title, "Count people");
    assert!(s.next());
    assert_eq!(s.current().title, "Broken");
    assert!(!s.next());
    assert_eq!(s.view().navigation.hash, "challenge=2");
  }

  #[test]
  fn invalid_hash_falls_back_to_first_entry() {
    let state = state();
    let s = Session::start(&state, Some("challenge=42"));
    assert_eq!(s.navigation().current(), 0);
    assert!(Session::at_index(&state, 3).is_none());
  }

  #[test]
  fn run_grades_and_keeps_changes_until_reload() {
    let state = state();
    let mut s = Session::start(&state, None);
    assert_eq!(s.run("SELECT COUNT(*) AS n FROM p").outcome, Outcome::Success);
    assert_eq!(s.run("SELEC").outcome, Outcome::ExecutionError);
    assert_eq!(s.run("INSERT INTO p VALUES ('c')").outcome, Outcome::Mismatch);
    assert_eq!(s.run("SELECT COUNT(*) AS n FROM p").outcome, Outcome::Mismatch);
    s.reload();
    assert_eq!(s.run("SELECT COUNT(*) AS n FROM p").outcome, Outcome::Success);
  }

  #[test]
  fn runaway_query_is_an_execution_error() {
    let mut state = state();
    state.limits = QueryLimits { max_rows: 100, ..QueryLimits::default() };
    let mut s = Session::start(&state, None);
    let verdict = s.run("WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c");
    assert_eq!(verdict.outcome, Outcome::ExecutionError);
    assert!(verdict.message.contains("more than 100 rows"), "{}", verdict.message);
    // Limits survive a reload.
    s.reload();
    assert_eq!(s.run("WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c").outcome, Outcome::ExecutionError);
  }

  #[test]
  fn broken_schema_reports_execution_error() {
    let state = state();
    let mut s = Session::at_index(&state, 2).expect("session");
    assert_eq!(s.run("SELECT 1").outcome, Outcome::ExecutionError);
    assert!(s.view().tables.is_empty());
  }

  #[test]
  fn view_includes_tables_and_navigation() {
    let state = state();
    let mut s = Session::at_index(&state, 0).expect("session");
    let view = s.view();
    assert_eq!(view.level_class, "intermediate");
    assert_eq!(view.tables[0].name, "p");
    assert_eq!(view.navigation.logical, 1);
    assert!(view.navigation.has_previous && view.navigation.has_next);
  }
}
