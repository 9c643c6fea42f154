//! Logging setup for Tether.
//!
//! The engine emits `tracing` events; nothing is printed unless a subscriber
//! is installed, either by the application or by [`init`].
//!
//! # Environment Variables
//!
//! - `TETHER_DEBUG=true` - Enable debug logging
//! - `TETHER_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `TETHER_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! ```rust,no_run
//! use tether_query::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `TETHER_DEBUG`.
///
/// Returns `true` if it is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("TETHER_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `TETHER_LOG_LEVEL`.
///
/// Defaults to "debug" if `TETHER_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    env::var("TETHER_LOG_LEVEL")
        .ok()
        .and_then(|level| parse_level(&level))
        .unwrap_or(fallback)
}

/// Normalize a level name; `None` when it is not a known level.
fn parse_level(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Get the configured log format from `TETHER_LOG_FORMAT`; defaults to "json".
pub fn get_log_format() -> &'static str {
    env::var("TETHER_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize the Tether logging system.
///
/// Does nothing unless `TETHER_DEBUG` or `TETHER_LOG_LEVEL` is set. Subsequent
/// calls are no-ops. Without the `tracing-subscriber` feature this does nothing
/// and the application is expected to install its own subscriber.
pub fn init() {
    if !is_debug_enabled() && env::var("TETHER_LOG_LEVEL").is_err() {
        return;
    }
    install(get_log_level());
}

/// Initialize logging with a specific level, ignoring `TETHER_LOG_LEVEL`.
///
/// Unknown level names fall back to "warn". Subsequent calls are no-ops.
pub fn init_with_level(level: &str) {
    install(parse_level(level).unwrap_or("warn"));
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(unused_variables))]
fn install(level: &'static str) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!("tether={},tether_query={}", level, level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            match get_log_format() {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(
                level = level,
                format = get_log_format(),
                "Tether logging initialized"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // SAFETY: no other test in this crate touches these variables
        unsafe {
            env::remove_var("TETHER_DEBUG");
            env::remove_var("TETHER_LOG_LEVEL");
            env::remove_var("TETHER_LOG_FORMAT");
        }
        assert!(!is_debug_enabled());
        assert_eq!(get_log_level(), "warn");
        assert_eq!(get_log_format(), "json");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some("debug"));
        assert_eq!(parse_level("error"), Some("error"));
        assert_eq!(parse_level("verbose"), None);
    }
}
