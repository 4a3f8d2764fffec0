//! Application Configuration
//! Source locations and view defaults, optionally read from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Our World in Data CO2 & GDP dataset (semicolon separated).
pub const EMISSIONS_URL: &str = "https://drive.switch.ch/index.php/s/BrEq5fWfSW5sUEq/download";

/// Country → World Bank region mapping (semicolon separated).
pub const REGIONS_URL: &str = "https://drive.switch.ch/index.php/s/hUkzz67kE1YkLE9/download";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub emissions_url: String,
    pub regions_url: String,
    /// Year shown first; clamped into the observed year range.
    pub default_year: i32,
    /// Rows in the dataset overview table.
    pub sample_size: usize,
    pub sample_seed: u64,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            emissions_url: EMISSIONS_URL.to_string(),
            regions_url: REGIONS_URL.to_string(),
            default_year: 1964,
            sample_size: 10,
            sample_seed: 23,
            http_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Read a config file. Missing keys fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = AppConfig::from_json_str(r#"{ "default_year": 2000 }"#).unwrap();
        assert_eq!(cfg.default_year, 2000);
        assert_eq!(cfg.emissions_url, EMISSIONS_URL);
        assert_eq!(cfg.sample_size, 10);
        assert_eq!(cfg.http_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn malformed_config_is_rejected() {
        let err = AppConfig::from_json_str("{ default_year: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
