//! The root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, MetricsConfig, RouterConfig, ServerConfig};

/// Complete Grove service configuration.
///
/// Every section and field has a default, so an empty document is valid.
///
/// # Example
///
/// ```
/// use grove_config::GroveConfig;
///
/// let config = GroveConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GroveConfig {
    /// Serving loop.
    #[serde(default)]
    pub server: ServerConfig,

    /// Router construction.
    #[serde(default)]
    pub router: RouterConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl GroveConfig {
    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field:
    /// - `server.http_addr` or an enabled `metrics.addr` is not a socket address
    /// - `server.request_timeout_ms` is zero
    /// - `router.prefix` is non-empty and does not start with `/`
    /// - `router.content_type` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if !self.router.prefix.is_empty() && !self.router.prefix.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "router.prefix",
                format!("must be empty or start with '/': {}", self.router.prefix),
            ));
        }

        if self.router.content_type.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "router.content_type",
                "must not be empty",
            ));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        Ok(())
    }

    /// Local development: loopback bind, pretty `debug` logs with call sites,
    /// no metrics listener.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                http_addr: "127.0.0.1:8080".to_string(),
                shutdown_timeout_secs: 5,
                ..ServerConfig::default()
            },
            router: RouterConfig::default(),
            logging: LoggingConfig {
                enabled: true,
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
            },
            metrics: MetricsConfig::default(),
        }
    }

    /// Production: JSON `info` logs and the Prometheus listener enabled.
    #[must_use]
    pub fn production() -> Self {
        Self {
            server: ServerConfig::default(),
            router: RouterConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig {
                enabled: true,
                ..MetricsConfig::default()
            },
        }
    }
}
