//! zapstats-server - response-time analytics API for the support dashboard
//!
//! Serves the dashboard's engagement metrics from the hosted message log.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/zapstats/config.toml (~/.config/zapstats/config.toml)
//! - Logs: $XDG_STATE_HOME/zapstats/zapstats.log (~/.local/state/zapstats/zapstats.log)

mod api;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use zapstats_core::{Config, FeedClient, StatsEngine};

#[derive(Parser)]
#[command(name = "zapstats-server")]
#[command(about = "Serve WhatsApp support engagement metrics")]
#[command(version)]
struct Args {
    /// Path to config file (defaults to the XDG location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard =
        zapstats_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("zapstats-server starting");

    let feed = FeedClient::new(&config.feed).context("failed to create feed client")?;
    let engine = StatsEngine::new(feed)
        .with_window_days(config.feed.window_days)
        .with_page_size(config.feed.page_size);

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);

    api::run_server(engine, config.server.service_token, host, port).await
}
