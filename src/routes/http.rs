//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and basic result info.
//! Anything that opens a challenge database runs on the blocking pool.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{error, info, instrument};

use crate::logic::*;
use crate::navigation::LevelGroup;
use crate::protocol::*;
use crate::state::AppState;

type HttpError = (StatusCode, Json<ErrorOut>);

fn not_found(message: String) -> HttpError {
  (StatusCode::NOT_FOUND, Json(ErrorOut { message }))
}

async fn off_runtime<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> Result<T, HttpError> {
  tokio::task::spawn_blocking(work).await.map_err(|e| {
    error!(target: "sql_trainer", error = %e, "Blocking task failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorOut { message: "Internal error".into() }))
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, challenges: state.challenges.len() })
}

/// Selector contents: level groups in traversal order.
#[instrument(level = "info", skip(state))]
pub async fn http_get_challenges(State(state): State<Arc<AppState>>) -> Json<Vec<LevelGroup>> {
  Json(state.navigation.groups().to_vec())
}

#[instrument(level = "info", skip(state), fields(hash = ?q.hash, index = ?q.index))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ChallengeQuery>,
) -> Result<Json<ChallengeView>, HttpError> {
  let ChallengeQuery { hash, index } = q;
  let view = off_runtime(move || challenge_for(&state, hash.as_deref(), index))
    .await?
    .ok_or_else(|| not_found(format!("Unknown challenge index: {}", index.unwrap_or_default())))?;
  info!(target: "challenge", index = view.index, hash = %view.navigation.hash, "HTTP challenge served");
  Ok(Json(view))
}

#[instrument(level = "info", skip(state, body), fields(index = body.challenge_index, sql_len = body.sql.len()))]
pub async fn http_post_run(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RunIn>,
) -> Result<Json<crate::validate::Verdict>, HttpError> {
  let index = body.challenge_index;
  let sql = body.sql;
  let verdict = off_runtime(move || run_once(&state, index, &sql))
    .await?
    .ok_or_else(|| not_found(format!("Unknown challenge index: {}", index)))?;
  info!(target: "challenge", index, outcome = ?verdict.outcome, "HTTP run evaluated");
  Ok(Json(verdict))
}

#[instrument(level = "info", skip(body), fields(sql_len = body.sql.len()))]
pub async fn http_post_highlight(Json(body): Json<HighlightIn>) -> impl IntoResponse {
  Json(HighlightOut { spans: highlight(&body.sql) })
}
