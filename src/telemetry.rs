//! Logging setup for the trainer.
//!
//! - LOG_LEVEL: filter directives. Unset or unparsable falls back to
//!   `DEFAULT_FILTER`, which keeps learner activity (`challenge`) and service
//!   plumbing (`sql_trainer`) at debug and the HTTP stack at info.
//! - LOG_FORMAT: "pretty" (default), "compact" or "json". JSON lines carry the
//!   enclosing span fields, so a session id attached by `Session::run` shows up
//!   on every event logged beneath it.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,challenge=debug,sql_trainer=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Filter from LOG_LEVEL directives, or the default when they are missing or invalid.
pub fn filter_from(raw: Option<&str>) -> (EnvFilter, Option<String>) {
    match raw.map(|r| (r, EnvFilter::try_new(r))) {
        Some((_, Ok(filter))) => (filter, None),
        Some((r, Err(e))) => (EnvFilter::new(DEFAULT_FILTER), Some(format!("Ignoring LOG_LEVEL {r:?}: {e}"))),
        None => (EnvFilter::new(DEFAULT_FILTER), None),
    }
}

pub fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok();
    let (filter, rejected) = filter_from(level.as_deref());
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Each format is a different builder type, so init in each arm.
    match format {
        LogFormat::Json => builder.json().with_current_span(true).with_span_list(false).init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }

    if let Some(reason) = rejected {
        tracing::warn!(target: "sql_trainer", "{reason}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" compact ")), LogFormat::Compact);
        assert_eq!(LogFormat::parse(Some("bunyan")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }

    #[test]
    fn bad_directives_fall_back_to_default() {
        let (filter, rejected) = filter_from(Some("sql_trainer=loud"));
        assert!(rejected.is_some());
        assert_eq!(filter.to_string(), EnvFilter::new(DEFAULT_FILTER).to_string());

        let (filter, rejected) = filter_from(Some("warn,challenge=trace"));
        assert!(rejected.is_none());
        assert!(filter.to_string().contains("challenge=trace"));

        assert!(filter_from(None).1.is_none());
    }
}
