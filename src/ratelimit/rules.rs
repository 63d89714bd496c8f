//! Rate limit rules configuration and scope matching.
//!
//! Rules map a scope (the part of a key before the first `:`) to the
//! policy applied to it, with an optional default for unlisted scopes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::counter::LimitPolicy;
use crate::error::{HirewiseError, Result};

/// The full set of scope rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitRules {
    /// Applied to scopes without their own rule
    #[serde(default)]
    pub default: Option<RateLimitRule>,
    /// Per-scope rules; the first matching scope wins
    #[serde(default)]
    pub scopes: Vec<ScopeRule>,
}

/// A rule for a single scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeRule {
    /// The scope to match, e.g. `job-search`
    pub scope: String,
    /// Limit applied to the scope
    pub rate_limit: RateLimitRule,
}

/// A rate limit rule: requests per unit of time or per explicit window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitRule {
    /// Number of requests allowed per window
    pub requests_per_unit: u32,
    /// The time unit
    #[serde(default)]
    pub unit: Option<TimeUnit>,
    /// Explicit window length; overrides `unit`
    #[serde(default)]
    pub window_ms: Option<u64>,
}

/// Time unit for rate limit windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Get the duration of this time unit.
    pub fn duration(&self) -> Duration {
        match self {
            TimeUnit::Second => Duration::from_secs(1),
            TimeUnit::Minute => Duration::from_secs(60),
            TimeUnit::Hour => Duration::from_secs(3600),
            TimeUnit::Day => Duration::from_secs(86400),
        }
    }
}

impl RateLimitRule {
    /// Convert the rule into a validated policy.
    pub fn to_policy(&self) -> Result<LimitPolicy> {
        let window = match (self.window_ms, self.unit) {
            (Some(ms), _) => Duration::from_millis(ms),
            (None, Some(unit)) => unit.duration(),
            (None, None) => {
                return Err(HirewiseError::Config(
                    "rate limit needs either `unit` or `window_ms`".to_string(),
                ))
            }
        };
        LimitPolicy::new(self.requests_per_unit, window)
    }
}

impl RateLimitRules {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limit rules");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load and validate rules from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let rules: RateLimitRules = serde_yaml::from_str(yaml).map_err(|e| {
            HirewiseError::Config(format!("Failed to parse rate limit rules: {}", e))
        })?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check that every rule yields a usable policy.
    pub fn validate(&self) -> Result<()> {
        if let Some(default) = &self.default {
            default
                .to_policy()
                .map_err(|e| HirewiseError::Config(format!("default rule: {}", e)))?;
        }
        for rule in &self.scopes {
            if rule.scope.is_empty() {
                return Err(HirewiseError::Config("scope name must not be empty".to_string()));
            }
            rule.rate_limit
                .to_policy()
                .map_err(|e| HirewiseError::Config(format!("scope `{}`: {}", rule.scope, e)))?;
        }
        Ok(())
    }

    /// Find the policy for a scope, falling back to the default rule.
    pub fn policy_for(&self, scope: &str) -> Option<LimitPolicy> {
        self.scopes
            .iter()
            .find(|rule| rule.scope == scope)
            .map(|rule| &rule.rate_limit)
            .or(self.default.as_ref())
            .and_then(|rule| rule.to_policy().ok())
    }
}
