//! # Telemetry
//!
//! Tracing subscriber setup for the engine binaries.
//!
//! ## Filter Resolution
//! ```text
//! RUST_LOG set? ──yes──► RUST_LOG
//!      │ no
//!      ▼
//! [logging] filter / TALLY_LOG set? ──yes──► configured filter
//!      │ no
//!      ▼
//! "info,tally=debug,sqlx=warn"
//! ```
//!
//! Logs go to stderr so `tally-promo` can print JSON on stdout.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Filter used when nothing is configured.
pub const DEFAULT_FILTER: &str = "info,tally=debug,sqlx=warn";

/// Picks the filter directives: environment, then config, then the default.
pub fn filter_directives(env: Option<&str>, configured: Option<&str>) -> String {
    env.filter(|s| !s.trim().is_empty())
        .or(configured.filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Initializes the tracing subscriber.
///
/// Safe to call more than once; later calls keep the installed subscriber and
/// say so at debug level. An unparseable filter falls back to [`DEFAULT_FILTER`].
pub fn init_tracing(configured: Option<&str>) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(env.as_deref(), configured);

    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        debug!(error = %e, "Tracing subscriber already installed, keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_wins() {
        assert_eq!(filter_directives(Some("trace"), Some("warn")), "trace");
    }

    #[test]
    fn test_configured_used_without_env() {
        assert_eq!(filter_directives(None, Some("warn")), "warn");
        assert_eq!(filter_directives(Some("  "), Some("warn")), "warn");
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(filter_directives(None, None), DEFAULT_FILTER);
        assert_eq!(filter_directives(None, Some("")), DEFAULT_FILTER);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(Some("warn"));
        init_tracing(None);
        init_tracing(Some("not a [valid filter"));
        assert!(tracing::dispatcher::has_been_set());
    }
}
