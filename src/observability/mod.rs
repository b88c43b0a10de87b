//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every module handler produces:
//!     → logging.rs (structured log events, rejections at warn)
//!     → metrics.rs (lab_requests_total by module, strategy, outcome)
//!
//! Consumers:
//!     → stdout (human-readable or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through the trace span of every request
//! - Metrics are cheap (atomic increments); recording without an
//!   installed exporter is a no-op

pub mod logging;
pub mod metrics;
