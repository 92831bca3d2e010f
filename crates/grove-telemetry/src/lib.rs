//! Observability for Grove services.
//!
//! - **Logging**: a `tracing` subscriber with JSON or pretty output
//! - **Metrics**: request counters and latency histograms through the
//!   `metrics` facade, exported to Prometheus
//!
//! The routing layer records into both unconditionally; nothing is emitted
//! until the application installs a subscriber or recorder.
//!
//! # Example
//!
//! ```rust,ignore
//! use grove_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_telemetry(&LogConfig::production(), &MetricsConfig::default())
//!         .expect("telemetry");
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};
pub use metrics::{
    describe_metrics, init_metrics, record_panic, record_request, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem failure.
pub fn init_telemetry(logging: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(logging)?;
    init_metrics(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_telemetry_initializes() {
        let logging = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_telemetry(&logging, &MetricsConfig::default()).is_ok());
    }
}
