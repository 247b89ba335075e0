//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use sprout_types::{RewardParams, VerificationParams};
use sprout_utils::LogFormat;

use crate::NodeError;

/// Configuration for a Sprout engine.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). An empty file is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the evidence classifier. Without one the content stage
    /// always runs degraded.
    #[serde(default)]
    pub classifier_url: Option<String>,

    /// Base URL of an OpenWeather-compatible API.
    #[serde(default)]
    pub weather_url: Option<String>,

    #[serde(default)]
    pub weather_api_key: Option<String>,

    /// Base URL of a vegetation-index service for the satellite bonus stage.
    #[serde(default)]
    pub satellite_url: Option<String>,

    /// Base URL of the minting gateway. Approvals are only minted when set.
    #[serde(default)]
    pub mint_url: Option<String>,

    /// Request timeout for every HTTP adapter, in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default)]
    pub verification: VerificationParams,

    #[serde(default)]
    pub rewards: RewardParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber described by this config.
    pub fn init_logging(&self) -> Result<(), NodeError> {
        sprout_utils::init_logging(self.log_format, &self.log_level)?;
        Ok(())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        let v = &self.verification;
        if v.review_threshold > v.approve_threshold {
            return Err(NodeError::Config(format!(
                "review threshold {} is above approve threshold {}",
                v.review_threshold, v.approve_threshold
            )));
        }
        if v.required_gestures == 0 {
            return Err(NodeError::Config("required_gestures must be at least 1".into()));
        }
        if !(v.geo_radius_m.is_finite() && v.geo_radius_m >= 0.0) {
            return Err(NodeError::Config(format!("invalid geo radius {}", v.geo_radius_m)));
        }
        if self
            .rewards
            .streak_milestones
            .windows(2)
            .any(|w| w[0].days >= w[1].days)
        {
            return Err(NodeError::Config("streak milestones must be strictly ascending".into()));
        }
        if self.weather_url.is_some() && self.weather_api_key.is_none() {
            return Err(NodeError::Config("weather_url is set but weather_api_key is missing".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier_url: None,
            weather_url: None,
            weather_api_key: None,
            satellite_url: None,
            mint_url: None,
            http_timeout_ms: default_http_timeout_ms(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            enable_metrics: false,
            verification: VerificationParams::default(),
            rewards: RewardParams::default(),
        }
    }
}
