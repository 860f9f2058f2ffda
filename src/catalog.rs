//! Loading the challenge catalogue (a JSON array of challenges).

use std::path::Path;

use tracing::{info, instrument};

use crate::domain::Challenge;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
  #[error("Failed to read challenge catalogue '{path}': {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to parse challenge catalogue '{path}': {source}")]
  Json {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("Challenge catalogue is empty")]
  Empty,
}

/// Parses a catalogue from JSON text. An empty array is an error.
pub fn parse_catalog(raw: &str, path: &str) -> Result<Vec<Challenge>, CatalogError> {
  let challenges: Vec<Challenge> =
    serde_json::from_str(raw).map_err(|source| CatalogError::Json { path: path.to_string(), source })?;
  if challenges.is_empty() {
    return Err(CatalogError::Empty);
  }
  Ok(challenges)
}

#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<Challenge>, CatalogError> {
  let path = path.as_ref();
  let shown = path.display().to_string();
  let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io { path: shown.clone(), source })?;
  let challenges = parse_catalog(&raw, &shown)?;
  info!(target: "sql_trainer", path = %shown, count = challenges.len(), "Loaded challenge catalogue");
  Ok(challenges)
}
