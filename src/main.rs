use std::path::PathBuf;

use clap::Parser;

use search_broker::config::{load_config, BrokerConfig};
use search_broker::{lifecycle, observability};

/// Reverse proxy brokering access to a backend search cluster.
#[derive(Parser, Debug)]
#[command(name = "search-broker", version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "FILE", default_value = "broker.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_found = args.config.exists();
    let config = if config_found {
        load_config(&args.config)?
    } else {
        BrokerConfig::default()
    };

    observability::logging::init(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "search-broker starting");
    if !config_found {
        tracing::warn!(
            path = %args.config.display(),
            "config file not found, using defaults"
        );
    }
    tracing::info!(
        bind_address = %config.listener.bind_address,
        data_cluster = %config.clusters.data.url,
        admin_cluster = %config.clusters.admin.url,
        health_check_delay_ms = config.health_check.delay_ms,
        "configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
