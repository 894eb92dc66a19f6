//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,quiz=debug,workflow=debug,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Notes:
//! - Targets used across the crate: `recipe_vocab`, `quiz`, `recipe`, `workflow`, `store`.
//!   They are printed so a quiz failure can be told apart from a store or workflow one.
//! - Credentials never reach the logs; workflow bodies are truncated via `util::trunc_for_log`.

use tracing_subscriber::EnvFilter;

/// Used when LOG_LEVEL is unset or unparsable.
const DEFAULT_FILTER: &str = "info,quiz=debug,recipe=debug,workflow=debug,store=info,tower_http=info,axum=info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn wants_json(format: Option<&str>) -> bool {
    matches!(format.map(str::trim), Some(f) if f.eq_ignore_ascii_case("json"))
}

pub fn init_tracing() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let format = std::env::var("LOG_FORMAT").ok();
    // The json and pretty builders are different types, so each branch inits its own.
    if wants_json(format.as_deref()) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_json_selects_structured_output() {
        assert!(wants_json(Some("json")));
        assert!(wants_json(Some(" JSON ")));
        assert!(!wants_json(Some("pretty")));
        assert!(!wants_json(None));
    }

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<EnvFilter>().is_ok());
    }
}
