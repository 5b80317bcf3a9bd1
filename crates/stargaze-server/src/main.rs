//! Stargaze server binary
//!
//! Loads the configuration, wires the chat and ingestion services and serves
//! them over HTTP until interrupted.

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use stargaze_core::{ConfigLoader, ServiceFactory};
use stargaze_server::{shutdown_signal, ServerConfig, StargazeServer};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Stargaze Server - Chat with your starred GitHub repositories")]
struct Cli {
    #[clap(long, short, help = "Path to a YAML configuration file")]
    config: Option<PathBuf>,

    #[clap(long, help = "Bind address, overrides the configuration file")]
    bind_addr: Option<String>,

    #[clap(long, short, default_value = "info")]
    log_level: String,

    #[clap(long, help = "Disable CORS headers")]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    match &cli.config {
        Some(path) => log::info!("Loading configuration from: {}", path.display()),
        None => log::info!("No configuration file given, using defaults and environment"),
    }
    let config = ConfigLoader::load(cli.config.as_deref()).await?;
    log::info!(
        "Configuration loaded: provider={:?}, database={}",
        config.ai.provider,
        if config.database.url.is_some() {
            "postgres"
        } else {
            "in-memory"
        }
    );

    let services = ServiceFactory::create_from_config(&config).await?;
    log::info!("Services created.");

    let mut server_config = ServerConfig::from_settings(&config.server)?.with_cors(!cli.no_cors);
    if let Some(bind_addr) = &cli.bind_addr {
        server_config = server_config
            .with_bind_addr_str(bind_addr)
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", bind_addr, e))?;
    }

    log::info!("Starting Stargaze server on {}...", server_config.bind_addr);
    let server = StargazeServer::with_config(services, server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
