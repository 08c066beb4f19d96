//! Node gateway server.
//!
//! Serves the node's HTTP API behind CSRF, Host and Origin protection.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ request ID ─▶ Host check ─▶ Origin check ─▶ CSRF ─▶ handler ─▶ backend
//!                                        │             │             │         │
//!     Client Response                    ▼             ▼             ▼         ▼
//!     ◀─────────────── security headers ◀──────── 403 text ◀──────────── gen-1 / gen-2 envelope
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use node_gateway::config::{load_config, GatewayConfig};
use node_gateway::gateway::{Backend, MemoryGateway};
use node_gateway::lifecycle::{shutdown_on_signal, Shutdown};
use node_gateway::observability::{logging, metrics};
use node_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "node-gateway")]
#[command(about = "HTTP API gateway for a blockchain node", long_about = None)]
struct Args {
    /// Path to the TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "node-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        csrf_enabled = config.csrf.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    // The Host whitelist needs the real port when the config asked for 0
    config.listener.bind_address = local_addr.to_string();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let backend = Backend::from_gateway(Arc::new(MemoryGateway::new()));
    let server = HttpServer::new(config, backend)?;

    let shutdown = Arc::new(Shutdown::new());
    let rx = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move { shutdown_on_signal(&trigger).await });

    server.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
