//! tsadd - time-series anomaly detection service
//!
//! Serves the detection, method catalog and preprocessing endpoints over HTTP.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tsad_service::{Server, ServiceConfig, ServiceError, ServiceResult};

/// tsad daemon CLI
#[derive(Parser)]
#[command(name = "tsadd")]
#[command(about = "Time-series anomaly detection service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TSAD_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "TSAD_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "TSAD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "TSAD_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> ServiceResult<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref())?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| ServiceError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        max_series_len = config.server.max_series_len,
        min_valid_points = config.detection.min_valid_points,
        "starting tsadd"
    );

    Server::new(config).run().await
}
