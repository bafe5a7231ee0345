//! Request Lifecycle
//!
//! Per-request scope: `received -> dispatching -> responded | aborted`.
//! The guard's `Drop` is the release path, and it runs on every exit,
//! including client disconnect (the request future is dropped mid-flight).
//! There is no retry here: a dropped connection surfaces as a failed
//! attempt, and every call is independently retryable by the client.

use std::time::Instant;

use tracing::debug;

use super::metrics;

pub struct RequestScope {
    method: String,
    started: Instant,
    responded: bool,
}

impl RequestScope {
    pub fn begin(method: &str) -> Self {
        debug!("MCP request received: {}", method);
        Self {
            method: method.to_string(),
            started: Instant::now(),
            responded: false,
        }
    }

    /// Mark the request as responded and record its outcome.
    pub fn finish(mut self, outcome: &str) {
        self.responded = true;
        metrics::MCP_REQUESTS_TOTAL
            .with_label_values(&[&self.method, outcome])
            .inc();
        debug!(
            "MCP request {} -> {} in {:?}",
            self.method,
            outcome,
            self.started.elapsed()
        );
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if !self.responded {
            metrics::MCP_REQUESTS_ABORTED_TOTAL.inc();
            debug!(
                "MCP request {} aborted after {:?}",
                self.method,
                self.started.elapsed()
            );
        }
    }
}
