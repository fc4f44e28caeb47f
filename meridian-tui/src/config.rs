//! Configuration loading for the meridian TUI.
//!
//! All fields are required. No defaults.

use meridian_graph::StoreOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    pub analysis_id: String,
    pub api_base_url: String,
    pub ws_endpoint: String,
    pub transport: TransportKind,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub refresh_interval_ms: u64,
    pub event_log_capacity: usize,
    pub citation_capacity: usize,
    pub log_path: PathBuf,
    /// Consecutive WebSocket failures before switching to polling; 0 = never
    pub fallback_to_polling_after: u32,
    pub reconnect: ReconnectConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Websocket,
    Polling,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    pub iterations: u32,
    pub spring_length: f64,
    pub repulsion: f64,
    pub spring_strength: f64,
    pub damping: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or MERIDIAN_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let mut config = Self::from_path(&path)?;
        if let Some(analysis_id) = analysis_id_from_args() {
            config.analysis_id = analysis_id;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: TuiConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_empty = [
            ("analysis_id", self.analysis_id.as_str()),
            ("api_base_url", self.api_base_url.as_str()),
            ("ws_endpoint", self.ws_endpoint.as_str()),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty"));
            }
        }
        if !self.ws_endpoint.starts_with("ws://") && !self.ws_endpoint.starts_with("wss://") {
            return Err(invalid("ws_endpoint", "must start with ws:// or wss://"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(invalid("api_base_url", "must start with http:// or https://"));
        }

        let positive = [
            ("request_timeout_ms", self.request_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("refresh_interval_ms", self.refresh_interval_ms),
            ("event_log_capacity", self.event_log_capacity as u64),
            ("citation_capacity", self.citation_capacity as u64),
            ("reconnect.initial_ms", self.reconnect.initial_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(invalid(field, "must be > 0"));
            }
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(invalid("log_path", "must not be empty"));
        }
        if self.reconnect.max_ms < self.reconnect.initial_ms {
            return Err(invalid("reconnect.max_ms", "must be >= initial_ms"));
        }
        if self.reconnect.multiplier < 1.0 {
            return Err(invalid("reconnect.multiplier", "must be >= 1.0"));
        }

        if self.layout.iterations == 0 {
            return Err(invalid("layout.iterations", "must be > 0"));
        }
        let layout_positive = [
            ("layout.spring_length", self.layout.spring_length),
            ("layout.repulsion", self.layout.repulsion),
            ("layout.spring_strength", self.layout.spring_strength),
        ];
        for (field, value) in layout_positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be a positive number"));
            }
        }
        if !(self.layout.damping > 0.0 && self.layout.damping < 1.0) {
            return Err(invalid("layout.damping", "must be between 0 and 1"));
        }
        Ok(())
    }

    /// Per-analysis WebSocket endpoint.
    pub fn ws_url(&self) -> String {
        format!("{}/{}", self.ws_endpoint.trim_end_matches('/'), self.analysis_id)
    }

    /// Per-analysis status resource used by the polling fallback.
    pub fn status_url(&self) -> String {
        format!(
            "{}/api/analysis/{}/status",
            self.api_base_url.trim_end_matches('/'),
            self.analysis_id
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            event_log_capacity: self.event_log_capacity,
            citation_capacity: self.citation_capacity,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("MERIDIAN_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    arg_value("--config").map(PathBuf::from)
}

fn analysis_id_from_args() -> Option<String> {
    arg_value("--analysis")
}

fn arg_value(flag: &str) -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == flag {
            return args.next();
        }
    }
    None
}
