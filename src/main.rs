//! Mitigation lab server.
//!
//! Loads the TOML configuration, prepares the filesystem and database,
//! and serves every module until SIGINT/SIGTERM.
//!
//! The vulnerable routes really are vulnerable: keep the listener on a
//! loopback address.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use mitigation_lab::config::loader::load_config;
use mitigation_lab::http::server::bind;
use mitigation_lab::lifecycle::signals::spawn_signal_listener;
use mitigation_lab::observability::{logging::init_logging, metrics::init_metrics};
use mitigation_lab::{LabConfig, LabServer};

#[derive(Parser)]
#[command(name = "mitigation-lab")]
#[command(about = "Web vulnerability demos next to their mitigations", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => LabConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mitigation-lab starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        config = ?args.config,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = bind(&config).await?;
    let server = LabServer::new(config).await?;
    spawn_signal_listener(server.shutdown_handle());

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
