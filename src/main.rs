//! Self-healing reverse proxy.
//!
//! ```text
//!     Client ──▶ http server ──▶ route table ──▶ weighted healthy selection
//!                                                     │
//!                                                     ▼
//!     Client ◀── response ◀── forward ◀── redirect / fallback on failure
//!
//!     scheduler: health probes ──▶ HealthMonitor
//!                predictions   ──▶ FailurePredictionEngine ──▶ alerts
//! ```

use std::path::PathBuf;

use clap::Parser;

use self_healing_proxy::config::loader::load_config;
use self_healing_proxy::config::validation::degenerate_services;
use self_healing_proxy::lifecycle::{signals, Gateway};
use self_healing_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "self-healing-proxy", version, about = "Self-healing reverse proxy")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "PROXY_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        services = config.services.len(),
        bind_address = %config.listener.bind_address,
        "self-healing-proxy starting"
    );
    tracing::info!(
        path = %args.config.display(),
        services = config.services.len(),
        "Configuration loaded"
    );
    for (service, warning) in degenerate_services(&config) {
        tracing::warn!(service = %service, "{}", warning);
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = Gateway::build(config);
    let shutdown = gateway.shutdown_handle();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    gateway.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
