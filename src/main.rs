//! SkyRoute Gateway
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!   Client Request       │                  GATEWAY                      │
//!   ─────────────────────┼─▶ http server ─▶ proxy::Gateway              │
//!                        │                   │  preflight / service /   │
//!                        │                   │  comments / routing      │
//!                        │                   ▼                          │
//!   Client Response      │               security ─▶ upstream ──────────┼──▶ Internal
//!   ◀────────────────────┼───────────────────────────────────────────── │     Service
//!                        │                                              │
//!                        │  config (TOML + env) · observability ·       │
//!                        │  lifecycle                                   │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use skyroute_gateway::comments::{KvStore, MemoryKv};
use skyroute_gateway::config::watcher::ConfigWatcher;
use skyroute_gateway::config::{load_config, EnvMap};
use skyroute_gateway::lifecycle::{wait_for_shutdown, Shutdown};
use skyroute_gateway::observability::{logging, metrics};
use skyroute_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "skyroute-gateway")]
#[command(about = "Host- and path-based gateway for home-lab services", long_about = None)]
struct Cli {
    /// Gateway configuration file (TOML).
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Dotenv file overlaid on the process environment.
    #[arg(long, default_value = ".env.local")]
    env_file: PathBuf,

    /// Reload the configuration when the file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    logging::init(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "skyroute-gateway starting");

    let env = EnvMap::load(Some(&cli.env_file))?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = match &config.comments.persistence_path {
        Some(path) => MemoryKv::load_from_file(path)?,
        None => MemoryKv::new(),
    };
    let shared_store: Arc<dyn KvStore> = Arc::new(store.clone());

    // The watcher handle must stay alive for reloads to keep arriving
    let (_watcher, config_updates) = if cli.watch {
        let (watcher, updates) = ConfigWatcher::new(&cli.config);
        (Some(watcher.run()?), updates)
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown().await;
        trigger.trigger();
    });

    let server = HttpServer::new(&config, env, shared_store)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    if let Err(e) = store.save_to_file() {
        tracing::error!(error = %e, "Failed to save comment store");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
