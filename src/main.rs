//! Front controller server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request id, trace, timeout, body limit)
//!                          │
//!                          ▼
//!                     FrontController ──▶ routing::Router (first matching rule)
//!                          │
//!                          ├──▶ credential check against the action prototype
//!                          ▼
//!                     render::MainRenderer
//!                          │  primary action ──▶ dispatch::Dispatcher (worker tasks)
//!                          ▼
//!                     FormatRenderer ("html" leveled pages, "json" models)
//!                          │  per depth: action batch, then fragments
//!                          ▼
//!     Client Response ◀── http::response
//!
//!     Cross-cutting: config (TOML + watcher), observability (tracing, Prometheus),
//!                    lifecycle (startup assembly, graceful shutdown)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use front_controller::action::builtin;
use front_controller::config::watcher::ConfigWatcher;
use front_controller::config::{load_config, FrontConfig};
use front_controller::lifecycle::{build_controller, signals, Shutdown};
use front_controller::observability::{logging, metrics};
use front_controller::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "front-controller", version, about = "Rule-routed front controller with leveled page rendering")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration when the file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FrontConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "front-controller starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rules = config.rules.len(),
        actions = config.actions.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let catalog = builtin::catalog();
    let controller = build_controller(&config, &catalog)?;

    // Keep the watcher alive for the life of the server.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), Some(updates))
        }
        _ => (None, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&config, controller, catalog);
    server.run(listener, config_updates, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
