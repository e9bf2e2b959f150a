//! Veil Server - Main entry point

use anyhow::Result;
use tracing::info;
use veil_common::logging::{init_logging, LogConfig};
use veil_server::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::default()
        .with_file_prefix("veil-server")
        .with_filter_directives("veil_server=debug,tower_http=debug,axum=trace,sqlx=info");

    // Environment variables take precedence over the built-in defaults
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting Veil Server");

    // Fails fast on a bad encryption key, before any connection is opened
    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    veil_server::api::serve(config).await
}
