//! SQL Trainer · challenge backend
//!
//! - Axum HTTP + WebSocket API
//! - Challenges run against an in-memory SQLite database per session
//! - Static SPA fallback (STATIC_DIR/index.html)
//!
//! Important env variables:
//!   PORT            : u16 (default 3000)
//!   CHALLENGES_PATH : challenge catalogue JSON (default "./challenges.json")
//!   STATIC_DIR      : front-end directory (default "./static")
//!   APP_CONFIG_PATH : optional TOML overriding the values above
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod catalog;
mod collation;
mod config;
mod domain;
mod engine;
mod highlight;
mod logic;
mod navigation;
mod protocol;
mod routes;
mod seeds;
mod session;
mod state;
mod telemetry;
mod util;
mod validate;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::from_env();

  // Catalogue + navigation order, shared read-only by every session.
  let state = Arc::new(AppState::new(&config)?);

  let app = build_router(state.clone(), &config.static_dir);

  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "sql_trainer", %addr, challenges = state.challenges.len(), "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
