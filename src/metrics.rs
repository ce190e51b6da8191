/// Metrics and telemetry for the Chlu Query gateway
///
/// Prometheus-compatible counters and histograms for:
/// - HTTP request counts and latencies
/// - Resolution outcomes per resource kind
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Duration;

lazy_static! {
    /// Total HTTP requests by method and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    /// Resolutions by resource kind and outcome
    pub static ref RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "resolutions_total",
        "Total number of resolutions by outcome",
        &["resource", "outcome"]
    )
    .unwrap();

    /// Time spent resolving, including collaborator calls
    pub static ref RESOLUTION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "resolution_duration_seconds",
        "Resolution latencies in seconds",
        &["resource"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();
}

/// Record an HTTP request
pub fn record_http_request(method: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration_secs);
}

/// Record a finished resolution
pub fn record_resolution(resource: &str, outcome: &str, elapsed: Duration) {
    RESOLUTIONS_TOTAL
        .with_label_values(&[resource, outcome])
        .inc();
    RESOLUTION_DURATION_SECONDS
        .with_label_values(&[resource])
        .observe(elapsed.as_secs_f64());
}

/// Render all registered metrics in the Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
