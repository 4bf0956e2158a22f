//! In-process metrics.
//!
//! Counters and latency histograms are stored as atomics behind `DashMap`
//! families and rendered by the `/metrics` handler in Prometheus text format.

pub mod metrics;

pub use metrics::{LatencyTimer, MetricsRegistry};

/// Requests received, labeled by endpoint.
pub const REQUESTS_TOTAL: &str = "api_requests_total";
/// Full `/predict` handler duration, labeled by endpoint.
pub const REQUEST_LATENCY_SECONDS: &str = "api_request_latency_seconds";
/// Failed requests, labeled by endpoint and client code.
pub const REQUEST_ERRORS_TOTAL: &str = "api_request_errors_total";

/// Register HELP text for the families the service emits.
pub fn describe_service_metrics(registry: &MetricsRegistry) {
    registry.describe(REQUESTS_TOTAL, "Total API requests by endpoint.");
    registry.describe(REQUEST_LATENCY_SECONDS, "API request latency in seconds.");
    registry.describe(REQUEST_ERRORS_TOTAL, "Failed API requests by endpoint and error code.");
}
