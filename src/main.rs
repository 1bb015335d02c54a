//! North Relay
//!
//! A single-route HTTP relay built with Tokio, Axum and reqwest.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 NORTH RELAY                  │
//!   GET /api          │  ┌────────┐   ┌────────┐   ┌──────────────┐  │
//!   ──────────────────┼─▶│  http  │──▶│  auth  │──▶│   upstream   │──┼──▶ north-case-api
//!                     │  │ server │   │strategy│   │    client    │  │
//!                     │  └────────┘   └────────┘   └──────┬───────┘  │
//!                     │                                   ▼          │
//!   reply             │                            ┌──────────────┐  │
//!   ◀─────────────────┼────────────────────────────│response mode │◀─┼─── upstream reply
//!                     │                            └──────────────┘  │
//!                     │  config (+hot reload) · lifecycle · logging  │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use north_relay::config::{load_config, watcher::ConfigWatcher, RelayConfig};
use north_relay::http::RelayServer;
use north_relay::lifecycle::{signals, Shutdown};
use north_relay::observability;

#[derive(Parser)]
#[command(name = "north-relay")]
#[command(about = "Relay GET /api to the north-case upstream", long_about = None)]
struct Cli {
    /// TOML config file. Watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    // The override only picks the socket; reloads still compare against the file.
    let bind_address = config
        .listener
        .effective_bind_address(cli.bind.as_deref())
        .to_string();

    observability::init_tracing(&config.observability.log_level);

    tracing::info!("north-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %bind_address,
        upstream = %config.upstream.url,
        auth_mode = ?config.auth.mode,
        response_mode = ?config.response.mode,
        "Configuration loaded"
    );

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path)?.spawn()?;
            (Some(watcher), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    let server = RelayServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
