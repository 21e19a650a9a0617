//! Reverse forwarding gateway.
//!
//! Accepts HTTP requests on one listener and relays each of them to a single
//! configured origin over a pooled HTTP/HTTPS transport.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request       ┌──────────────────────────────────────────────┐
//!     ─────────────────────┼─▶ http server ─▶ director ─▶ transport ──────┼──▶ Origin
//!                          │                                  │           │
//!     Client Response      │                                  ▼           │
//!     ◀────────────────────┼── rewriter (3xx Location) ◀── response ◀─────┼─── Origin
//!                          │        │                                     │
//!                          │        └─ on failure: translator → 502       │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use reverse_gateway::config::{read_config, validate_config, GatewayConfig};
use reverse_gateway::error::ConfigError;
use reverse_gateway::forward::{ForwardingEngine, Origin};
use reverse_gateway::http::GatewayServer;
use reverse_gateway::lifecycle::Shutdown;
use reverse_gateway::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "reverse-gateway", version, about = "Single-origin HTTP/HTTPS reverse forwarding gateway")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Origin URL, overriding `origin.url`.
    #[arg(short, long)]
    origin: Option<String>,

    /// Listen address, overriding `listener.bind_address`.
    #[arg(short, long)]
    listen: Option<String>,

    /// Accept any origin certificate.
    #[arg(long)]
    insecure_skip_verify: bool,

    /// Ask the origin for identity-encoded responses.
    #[arg(long)]
    disable_compression: bool,
}

impl Args {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(origin) = self.origin {
            config.origin.url = origin;
        }
        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if self.insecure_skip_verify {
            config.transport.tls_skip_verify = true;
        }
        if self.disable_compression {
            config.transport.disable_compression = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "reverse-gateway starting");

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let origin = Origin::parse(&config.origin.url)?;
    tracing::info!(
        origin = %origin,
        trust_mode = ?config.transport.trust_mode(),
        max_idle_connections = config.transport.max_idle_connections,
        idle_timeout_secs = config.transport.idle_timeout_secs,
        compression = !config.transport.disable_compression,
        "Configuration loaded"
    );

    let engine = ForwardingEngine::new(origin, &config.transport)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_ctrl_c());

    GatewayServer::new(engine).run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
