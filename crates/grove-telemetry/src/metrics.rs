//! Request metrics for Grove routes.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed. [`init_metrics`] installs a Prometheus recorder
//! together with its scrape listener.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `grove_requests_total` | Counter | `operation`, `status` |
//! | `grove_request_duration_seconds` | Histogram | `operation` |
//! | `grove_panics_recovered_total` | Counter | `operation` |

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Counter of dispatched requests.
pub const REQUESTS_TOTAL: &str = "grove_requests_total";

/// Histogram of dispatch latency.
pub const REQUEST_DURATION_SECONDS: &str = "grove_request_duration_seconds";

/// Counter of panics caught at the dispatch boundary.
pub const PANICS_RECOVERED_TOTAL: &str = "grove_panics_recovered_total";

const DURATION_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Metrics exporter configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the Prometheus recorder is installed.
    pub enabled: bool,

    /// Listener address for the scrape endpoint.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and its scrape listener.
///
/// Does nothing when metrics are disabled. Inside a Tokio runtime the
/// listener runs on that runtime; otherwise the exporter starts its own.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidAddress`] for an unparsable address and
/// [`TelemetryError::MetricsInit`] if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &DURATION_BUCKETS,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    describe_metrics();
    tracing::info!(%addr, "prometheus listener installed");
    Ok(())
}

/// Registers help text for the Grove metrics.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Requests dispatched, by operation and status");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time from dispatch to response, by operation"
    );
    describe_counter!(
        PANICS_RECOVERED_TOTAL,
        "Panics converted into error responses, by operation"
    );
}

/// Records one dispatched request.
pub fn record_request(operation: &str, status: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "operation" => operation.to_string())
        .record(duration.as_secs_f64());
}

/// Records a panic recovered while dispatching `operation`.
pub fn record_panic(operation: &str) {
    counter!(PANICS_RECOVERED_TOTAL, "operation" => operation.to_string()).increment(1);
}
