use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub guide: GuideConfig,
    pub gateway: GatewayConfig,
    pub timeouts: TimeoutsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// Guide cache and staleness sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
    /// Snapshots older than this are considered stale by callers and the sweeper
    pub freshness_window_secs: u64,
    /// How often the sweeper looks for stale guides (0 disables the sweeper)
    pub sweep_interval_secs: u64,
    /// Concurrent per-channel EPG requests during a refresh
    pub epg_concurrency: usize,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: 4 * 60 * 60,
            sweep_interval_secs: 600,
            epg_concurrency: 8,
        }
    }
}

impl GuideConfig {
    #[must_use]
    pub const fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// MediaMTX transcoding gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api_url: String,
    pub hls_base_url: String,
    pub webrtc_base_url: String,
    /// MediaMTX duration string, e.g. "10s"
    pub source_on_demand_start_timeout: String,
    /// MediaMTX duration string, e.g. "10s"
    pub source_on_demand_close_after: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:9997".to_string(),
            hls_base_url: "http://127.0.0.1:8888".to_string(),
            webrtc_base_url: "http://127.0.0.1:8889".to_string(),
            source_on_demand_start_timeout: "10s".to_string(),
            source_on_demand_close_after: "10s".to_string(),
        }
    }
}

/// Bounded timeouts for external calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Availability and readiness probes
    pub probe_secs: u64,
    /// Registration, guide fetches and hub service calls
    pub request_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            probe_secs: 2,
            request_secs: 30,
        }
    }
}

impl TimeoutsConfig {
    #[must_use]
    pub const fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    #[must_use]
    pub const fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        // Load config file if provided
        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // Override with environment variables (STREAMCAST_GUIDE__EPG_CONCURRENCY, etc.)
        builder = builder.add_source(
            Environment::with_prefix("STREAMCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check for misconfigurations. Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                self.logging.format
            ));
        }

        for (field, value) in [
            ("gateway.api_url", &self.gateway.api_url),
            ("gateway.hls_base_url", &self.gateway.hls_base_url),
            ("gateway.webrtc_base_url", &self.gateway.webrtc_base_url),
        ] {
            if url::Url::parse(value).is_err() {
                errors.push(format!("{field} is not a valid URL: {value:?}"));
            }
        }

        if self.guide.freshness_window_secs == 0 {
            errors.push("guide.freshness_window_secs must be greater than 0".to_string());
        }
        if self.guide.epg_concurrency == 0 {
            errors.push("guide.epg_concurrency must be greater than 0".to_string());
        }
        if self.timeouts.probe_secs == 0 || self.timeouts.request_secs == 0 {
            errors.push("timeouts must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
