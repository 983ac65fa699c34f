use metrics::{Counter, Histogram};
use metrics_derive::Metrics;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tokio::time::Duration;

/// Label for requests whose method is not served.
pub const UNKNOWN_METHOD: &str = "unknown";

/// `record_histogram` lets us record with tags.
pub fn record_histogram(rpc_latency: Duration, method: &'static str) {
    metrics::histogram!("mock_paymaster_rpc_latency", "method" => method)
        .record(rpc_latency.as_secs_f64());
}

/// Metrics for the `mock_paymaster` service.
/// Conventions:
/// - Durations are recorded in seconds (histograms).
/// - Counters are monotonic event counts.
#[derive(Metrics, Clone)]
#[metrics(scope = "mock_paymaster")]
pub struct Metrics {
    #[metric(describe = "Number of requests answered with a result")]
    pub requests_accepted: Counter,

    #[metric(describe = "Number of requests answered with an error")]
    pub requests_rejected: Counter,

    #[metric(describe = "Number of requests rejected before reaching a handler")]
    pub validation_failures: Counter,

    #[metric(describe = "Duration of handling a JSON-RPC request")]
    pub request_duration: Histogram,
}

/// Initialize Prometheus metrics exporter
pub fn init_prometheus_exporter(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
}
