//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Attack attempts are logged on the `security` target so they can be
//!   filtered separately (`RUST_LOG=security=warn`)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Target used for events describing attack attempts.
pub const SECURITY_TARGET: &str = "security";

/// Build the filter: `RUST_LOG` first, configured level otherwise.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "mitigation_lab={level},tower_http={level},security={level}",
            level = config.log_level
        ))
    })
}

/// Install the global subscriber.
///
/// Calling this twice (e.g. from tests) is harmless: the second
/// installation attempt is ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
