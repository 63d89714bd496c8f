//! Configuration management for Hirewise.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{HirewiseError, Result};
use crate::ratelimit::RateLimitRules;

/// Main configuration for the Hirewise tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HirewiseConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// How often expired windows are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Path to a standalone rules file; takes precedence over inline rules
    pub rules_path: Option<String>,

    /// Inline scope rules
    #[serde(default)]
    pub rules: RateLimitRules,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            rules_path: None,
            rules: RateLimitRules::default(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

impl RateLimitingConfig {
    /// Resolve the effective rules, reading `rules_path` when set.
    pub fn load_rules(&self) -> Result<RateLimitRules> {
        match &self.rules_path {
            Some(path) => RateLimitRules::from_file(path),
            None => {
                self.rules.validate()?;
                Ok(self.rules.clone())
            }
        }
    }
}

impl HirewiseConfig {
    /// Load configuration from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| HirewiseError::Config(e.to_string()))
    }
}
