//! Diagnostic logging setup.
//!
//! Events go to stderr so they never mix with replies on stdout. The filter
//! comes from `SOCRATIC_LOG` (standard `EnvFilter` syntax); without it the
//! level is derived from the number of `-v` flags.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SOCRATIC_LOG";

/// Default filter directive for a verbosity count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter, preferring an explicit `SOCRATIC_LOG` value.
pub fn build_filter(env_value: Option<&str>, verbosity: u8) -> EnvFilter {
    env_value
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_logging(verbosity: u8) {
    let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref(), verbosity);
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(9), "trace");
    }

    #[test]
    fn test_env_value_wins_over_verbosity() {
        let filter = build_filter(Some("socratic=trace"), 0);
        assert_eq!(filter.to_string(), "socratic=trace");
    }

    #[test]
    fn test_invalid_env_value_falls_back() {
        let filter = build_filter(Some("[[not a filter"), 1);
        assert_eq!(filter.to_string(), "info");
    }
}
