//! Telemetry error types.

use thiserror::Error;

/// Errors raised while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The Prometheus recorder could not be installed.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// The subscriber could not be installed or the filter is invalid.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The metrics listener address does not parse.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
