//! Configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serving loop settings.
///
/// # Example
///
/// ```
/// use grove_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_timeout().as_millis(), 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address, e.g. `"0.0.0.0:8080"`.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Time allowed for in-flight connections to drain on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request deadline in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    /// The shutdown drain window.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// The per-request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

/// Router construction settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Mount prefix prepended to every route pattern.
    #[serde(default)]
    pub prefix: String,

    /// Content type of the default codec.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Append `/` to every route pattern.
    #[serde(default)]
    pub trailing_slash: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            content_type: default_content_type(),
            trailing_slash: false,
        }
    }
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include file and line of each event.
    #[serde(default)]
    pub include_location: bool,
}

impl LoggingConfig {
    /// Converts into the settings understood by `grove_telemetry::init_logging`.
    #[must_use]
    pub fn to_log_config(&self) -> grove_telemetry::LogConfig {
        let base = match self.format {
            LogFormat::Json => grove_telemetry::LogConfig::production(),
            LogFormat::Pretty => grove_telemetry::LogConfig::development(),
        };
        grove_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            file_line_info: self.include_location,
            ..base
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Scrape listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl MetricsConfig {
    /// Converts into the settings understood by `grove_telemetry::init_metrics`.
    #[must_use]
    pub fn to_metrics_config(&self) -> grove_telemetry::MetricsConfig {
        grove_telemetry::MetricsConfig {
            enabled: self.enabled,
            addr: self.addr.clone(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_true() -> bool {
    true
}
