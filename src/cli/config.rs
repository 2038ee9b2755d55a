//! Configuration file
//!
//! ```json
//! {
//!   "locations": [
//!     { "directory": "/data/vol1", "max_volume_count": 8 },
//!     { "directory": "/data/vol2" }
//!   ],
//!   "concurrent_loading": true,
//!   "concurrency": 10,
//!   "log_level": "info"
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::location::{LoadOptions, DEFAULT_CONCURRENCY};
use crate::observability::Severity;
use crate::store::LocationConfig;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directories, loaded in order (required, non-empty)
    pub locations: Vec<LocationConfig>,

    /// Load each directory with a worker pool (default true)
    #[serde(default = "default_concurrent_loading")]
    pub concurrent_loading: bool,

    /// Worker count when concurrent loading is on (default 10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Minimum log severity: trace, info, warn, error (default info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_concurrent_loading() -> bool {
    true
}
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.locations.is_empty() {
            return Err(CliError::config_error("At least one location is required"));
        }

        let mut seen = HashSet::new();
        for location in &self.locations {
            if location.directory.as_os_str().is_empty() {
                return Err(CliError::config_error("Location directory must not be empty"));
            }
            if !seen.insert(&location.directory) {
                return Err(CliError::config_error(format!(
                    "Location {} is configured twice",
                    location.directory.display()
                )));
            }
        }

        if self.concurrency == 0 {
            return Err(CliError::config_error("concurrency must be >= 1"));
        }

        self.log_severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(|e| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    /// Options for every location load
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            concurrent: self.concurrent_loading,
            concurrency: self.concurrency,
            cancel: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(r#"{"locations": [{"directory": "/data"}]}"#).unwrap();
        assert!(config.concurrent_loading);
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.log_severity().unwrap(), Severity::Info);
        assert_eq!(config.locations[0].max_volume_count, 7);
        assert_eq!(config.load_options().worker_count(), 10);
    }

    #[test]
    fn test_sequential_mode() {
        let config = Config::from_json(
            r#"{"locations": [{"directory": "/data"}], "concurrent_loading": false, "concurrency": 4}"#,
        )
        .unwrap();
        assert_eq!(config.load_options().worker_count(), 1);
    }

    #[test]
    fn test_rejects_invalid() {
        let cases = [
            r#"{"locations": []}"#,
            r#"{"locations": [{"directory": ""}]}"#,
            r#"{"locations": [{"directory": "/a"}, {"directory": "/a"}]}"#,
            r#"{"locations": [{"directory": "/a"}], "concurrency": 0}"#,
            r#"{"locations": [{"directory": "/a"}], "log_level": "loud"}"#,
            r#"{"locations": "/a"}"#,
        ];
        for case in cases {
            assert!(Config::from_json(case).is_err(), "accepted: {}", case);
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bitstore.json");
        fs::write(
            &path,
            r#"{"locations": [{"directory": "/data", "max_volume_count": 3}], "log_level": "warn"}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.locations[0].max_volume_count, 3);
        assert_eq!(config.log_severity().unwrap(), Severity::Warn);

        assert!(Config::load(&dir.path().join("missing.json")).is_err());
    }
}
