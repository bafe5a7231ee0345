//! Prometheus metrics for the MCP front door.

use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use tracing::error;

/// Metric name prefix for all Taskdeck metrics
const PREFIX: &str = "taskdeck";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref MCP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_mcp_requests_total"), "Total MCP requests"),
        &["method", "outcome"]
    ).expect("Failed to create mcp_requests_total metric");

    pub static ref MCP_REQUESTS_ABORTED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_mcp_requests_aborted_total"),
        "MCP requests whose client disconnected before a response"
    ).expect("Failed to create mcp_requests_aborted_total metric");

    pub static ref TOOL_CALLS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_tool_calls_total"), "Tool invocations"),
        &["tool", "outcome"]
    ).expect("Failed to create tool_calls_total metric");

    pub static ref ORIGIN_DENIED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_origin_denied_total"),
        "Requests rejected by origin access control"
    ).expect("Failed to create origin_denied_total metric");
}

/// Register all metrics with the registry. Idempotent enough for tests:
/// a duplicate registration error is ignored.
pub fn register_metrics() {
    let _ = REGISTRY.register(Box::new(MCP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(MCP_REQUESTS_ABORTED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TOOL_CALLS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ORIGIN_DENIED_TOTAL.clone()));
}

/// `GET /metrics` handler, Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response();
    }
    match String::from_utf8(buffer) {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            error!("Metrics encoding produced invalid utf-8: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_is_idempotent() {
        register_metrics();
        register_metrics();
        MCP_REQUESTS_TOTAL.with_label_values(&["ping", "ok"]).inc();
        assert!(REGISTRY.gather().iter().any(|family| family
            .get_name()
            .contains("mcp_requests_total")));
    }
}
