//! Hydration settings, loadable from TOML.
//!
//! ```toml
//! [hydrate]
//! log_requests = true
//! slow_fetch_threshold_ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Settings for a [`Hydrator`](crate::relations::Hydrator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HydrateConfig {
    /// Log each rendered fetch statement at debug level.
    pub log_requests: bool,

    /// Fetches slower than this are logged as warnings.
    pub slow_fetch_threshold_ms: u64,
}

impl Default for HydrateConfig {
    fn default() -> Self {
        Self {
            log_requests: false,
            slow_fetch_threshold_ms: 1000,
        }
    }
}

/// A larger config file carrying a `[hydrate]` table.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    hydrate: HydrateConfig,
}

impl HydrateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::invalid_configuration(format!("cannot read {}: {}", path.display(), e))
                .with_source(e)
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string holding the settings at top level.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> QueryResult<Self> {
        toml::from_str(content).map_err(|e| {
            QueryError::invalid_configuration(e.message().to_string()).with_source(e)
        })
    }

    /// Parse the `[hydrate]` table of a larger TOML document; defaults when absent.
    ///
    /// Other tables in the document are ignored.
    pub fn from_table(content: &str) -> QueryResult<Self> {
        toml::from_str::<ConfigFile>(content)
            .map(|file| file.hydrate)
            .map_err(|e| {
                QueryError::invalid_configuration(e.message().to_string()).with_source(e)
            })
    }

    /// Slow fetch threshold as a duration.
    pub fn slow_fetch_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_fetch_threshold_ms)
    }

    /// Set request logging.
    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    /// Set the slow fetch threshold.
    pub fn slow_fetch_threshold_ms(mut self, ms: u64) -> Self {
        self.slow_fetch_threshold_ms = ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_defaults() {
        let config = HydrateConfig::default();
        assert!(!config.log_requests);
        assert_eq!(config.slow_fetch_threshold(), Duration::from_secs(1));
        assert_eq!(HydrateConfig::from_str("").unwrap(), config);
    }

    #[test]
    fn test_from_str_partial() {
        let config = HydrateConfig::from_str("slow_fetch_threshold_ms = 50").unwrap();
        assert_eq!(config.slow_fetch_threshold_ms, 50);
        assert!(!config.log_requests);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = HydrateConfig::from_str("log_request = true").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);

        let err = HydrateConfig::from_str("dedupe_correlation_values = false").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hydrate.toml");
        std::fs::write(&path, "log_requests = true\n").unwrap();

        let config = HydrateConfig::from_file(&path).unwrap();
        assert!(config.log_requests);

        let err = HydrateConfig::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_from_table() {
        let toml = r#"
            [database]
            url = "postgres://localhost/app"

            [hydrate]
            log_requests = true
        "#;
        let config = HydrateConfig::from_table(toml).unwrap();
        assert!(config.log_requests);
        assert_eq!(config.slow_fetch_threshold_ms, 1000);

        assert_eq!(
            HydrateConfig::from_table("[other]\nx = 1").unwrap(),
            HydrateConfig::default()
        );
    }
}
