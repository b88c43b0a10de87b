//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define lab metrics (per-strategy outcomes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `lab_requests_total` (counter): requests by module, strategy, outcome
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Outcome is one of `allowed`, `rejected`, `failed`

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// How a mitigation strategy disposed of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The input passed and the primitive ran.
    Allowed,
    /// The strategy refused the input.
    Rejected,
    /// The primitive itself failed.
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Allowed => "allowed",
            Outcome::Rejected => "rejected",
            Outcome::Failed => "failed",
        }
    }
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            metrics::describe_counter!(
                "lab_requests_total",
                "Requests handled, by module, mitigation strategy and outcome"
            );
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Count one request handled by `strategy` of `module`.
pub fn record_outcome(module: &'static str, strategy: &str, outcome: Outcome) {
    metrics::counter!(
        "lab_requests_total",
        "module" => module,
        "strategy" => strategy.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}
