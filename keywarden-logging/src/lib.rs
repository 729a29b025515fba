//! Structured logging setup for keywarden
//!
//! Logs are written to stderr; stdout is reserved for command output.

use std::io;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(default_level))
}

/// Filter for `level`, or `info` when it does not parse
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize JSON logging
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_logging(app_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_target(true)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    tracing::debug!(
        app = app_name,
        "Logging initialized"
    );
}

/// Initialize human-readable console logging
pub fn init_console_logging(app_name: &str, default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(
        app = app_name,
        "Console logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        assert_eq!(level_filter("keywarden=loud").to_string(), "info");
    }

    #[test]
    fn test_valid_level_kept() {
        assert_eq!(level_filter("debug").to_string(), "debug");
    }
}
