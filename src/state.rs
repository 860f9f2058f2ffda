//! Application state: the immutable challenge catalogue and its navigation order.
//!
//! The catalogue comes from the JSON file named in the config. When that file
//! cannot be used we fall back to the built-in seed challenges so the app still
//! has something to show. The navigation index is built once here and cloned
//! into every session.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::catalog::{load_catalog, CatalogError};
use crate::config::AppConfig;
use crate::domain::Challenge;
use crate::engine::QueryLimits;
use crate::navigation::NavigationIndex;
use crate::seeds::seed_challenges;

#[derive(Clone)]
pub struct AppState {
    pub challenges: Arc<Vec<Challenge>>,
    /// Traversal order, positioned at the first catalogue entry.
    pub navigation: NavigationIndex,
    /// Bounds for every learner script, whichever transport it came from.
    pub limits: QueryLimits,
}

impl AppState {
    /// Build state from config: load the catalogue (or seeds) and index it.
    #[instrument(level = "info", skip_all)]
    pub fn new(config: &AppConfig) -> Result<Self, CatalogError> {
        let challenges = match load_catalog(&config.challenges_path) {
            Ok(list) => list,
            Err(e) => {
                error!(target: "sql_trainer", error = %e, "Using built-in seed challenges");
                seed_challenges()
            }
        };
        let mut state = Self::from_challenges(challenges)?;
        state.limits = config.query_limits();
        info!(target: "sql_trainer", timeout = ?state.limits.timeout, max_rows = state.limits.max_rows, "Query limits");
        Ok(state)
    }

    pub fn from_challenges(challenges: Vec<Challenge>) -> Result<Self, CatalogError> {
        let navigation = NavigationIndex::build(&challenges).ok_or(CatalogError::Empty)?;
        for group in navigation.groups() {
            info!(target: "challenge", level = %group.level, count = group.entries.len(), "Startup challenge inventory");
        }
        debug!(target: "challenge", order = ?navigation.order(), "Traversal order");
        Ok(Self { challenges: Arc::new(challenges), navigation, limits: QueryLimits::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_seeds_when_catalogue_is_missing() {
        let config = AppConfig { challenges_path: "/no/such/catalogue.json".into(), ..AppConfig::default() };
        let state = AppState::new(&config).expect("state");
        assert_eq!(state.challenges.len(), seed_challenges().len());
        assert_eq!(state.navigation.current(), 0);
    }

    #[test]
    fn limits_follow_config() {
        let config = AppConfig { challenges_path: "/no/such/catalogue.json".into(), query_max_rows: 7, ..AppConfig::default() };
        let state = AppState::new(&config).expect("state");
        assert_eq!(state.limits.max_rows, 7);
    }

    #[test]
    fn empty_catalogue_is_rejected() {
        assert!(matches!(AppState::from_challenges(Vec::new()), Err(CatalogError::Empty)));
    }
}
