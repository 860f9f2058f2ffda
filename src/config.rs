//! Runtime configuration: environment variables, optionally overridden by a TOML file.
//!
//! Env:
//!   PORT            : u16 (default 3000)
//!   CHALLENGES_PATH : challenge catalogue JSON (default "./challenges.json")
//!   STATIC_DIR      : front-end files (default "./static")
//!   QUERY_TIMEOUT_MS: wall-clock budget per learner script (default 2000)
//!   QUERY_MAX_ROWS  : rows collected per statement before giving up (default 10000)
//!   APP_CONFIG_PATH : TOML file with any of the keys above, in snake_case

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::engine::QueryLimits;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
  pub port: u16,
  pub challenges_path: String,
  pub static_dir: String,
  pub query_timeout_ms: u64,
  pub query_max_rows: usize,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      challenges_path: "./challenges.json".into(),
      static_dir: "./static".into(),
      query_timeout_ms: 2_000,
      query_max_rows: 10_000,
    }
  }
}

/// TOML overrides. Every key is optional.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)] pub port: Option<u16>,
  #[serde(default)] pub challenges_path: Option<String>,
  #[serde(default)] pub static_dir: Option<String>,
  #[serde(default)] pub query_timeout_ms: Option<u64>,
  #[serde(default)] pub query_max_rows: Option<usize>,
}

impl AppConfig {
  /// Defaults, then env vars, then the TOML file (if any).
  pub fn from_env() -> Self {
    let mut cfg = Self::default();
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      cfg.port = port;
    }
    if let Ok(path) = std::env::var("CHALLENGES_PATH") {
      cfg.challenges_path = path;
    }
    if let Ok(dir) = std::env::var("STATIC_DIR") {
      cfg.static_dir = dir;
    }
    if let Some(ms) = std::env::var("QUERY_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()) {
      cfg.query_timeout_ms = ms;
    }
    if let Some(rows) = std::env::var("QUERY_MAX_ROWS").ok().and_then(|v| v.parse().ok()) {
      cfg.query_max_rows = rows;
    }
    if let Some(file) = load_file_config_from_env() {
      cfg.apply(file);
    }
    cfg
  }

  pub fn apply(&mut self, file: FileConfig) {
    if let Some(port) = file.port { self.port = port; }
    if let Some(path) = file.challenges_path { self.challenges_path = path; }
    if let Some(dir) = file.static_dir { self.static_dir = dir; }
    if let Some(ms) = file.query_timeout_ms { self.query_timeout_ms = ms; }
    if let Some(rows) = file.query_max_rows { self.query_max_rows = rows; }
  }

  pub fn query_limits(&self) -> QueryLimits {
    QueryLimits { timeout: Duration::from_millis(self.query_timeout_ms), max_rows: self.query_max_rows }
  }
}

/// Attempt to load `FileConfig` from APP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("APP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<FileConfig>(&s) {
      Ok(cfg) => {
        info!(target: "sql_trainer", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "sql_trainer", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "sql_trainer", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn toml_overrides_only_given_keys() {
    let file: FileConfig = toml::from_str("challenges_path = \"data/sql.json\"\nport = 8080\n").expect("toml");
    let mut cfg = AppConfig::default();
    cfg.apply(file);
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.challenges_path, "data/sql.json");
    assert_eq!(cfg.static_dir, "./static");
  }

  #[test]
  fn query_limits_come_from_toml() {
    let mut cfg = AppConfig::default();
    assert_eq!(cfg.query_limits(), QueryLimits::default());
    cfg.apply(toml::from_str("query_timeout_ms = 250\nquery_max_rows = 40\n").expect("toml"));
    assert_eq!(cfg.query_limits(), QueryLimits { timeout: Duration::from_millis(250), max_rows: 40 });
  }

  #[test]
  fn empty_toml_changes_nothing() {
    let mut cfg = AppConfig::default();
    cfg.apply(toml::from_str("").expect("toml"));
    assert_eq!(cfg, AppConfig::default());
  }
}
