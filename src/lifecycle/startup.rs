//! Startup orchestration.
//!
//! Wiring order matters: every registry `create` completes before the
//! gate or the server issue any `get`, so reads after startup need no
//! coordination beyond the shared reference.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::cluster::{
    ClusterConfig, ClusterRegistry, RegistryError, ADMIN_CLUSTER, DATA_CLUSTER, TRIBE_CLUSTER,
};
use crate::config::{BrokerConfig, ConfigError};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::readiness::{AdminClusterPinger, ReadinessGate};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cluster wiring error: {0}")]
    Registry(#[from] RegistryError),

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize all subsystems in dependency order and serve until
/// shutdown.
pub async fn run(config: BrokerConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let registry = Arc::new(ClusterRegistry::new());
    registry.create(
        DATA_CLUSTER,
        ClusterConfig::build(DATA_CLUSTER, &config.clusters.data, &config.defaults)?,
    )?;
    registry.create(
        ADMIN_CLUSTER,
        ClusterConfig::build(ADMIN_CLUSTER, &config.clusters.admin, &config.defaults)?,
    )?;
    if let Some(tribe) = &config.clusters.tribe {
        registry.create(
            TRIBE_CLUSTER,
            ClusterConfig::build(TRIBE_CLUSTER, tribe, &config.defaults)?,
        )?;
    }

    let pinger = Arc::new(AdminClusterPinger::new(Arc::clone(&registry)));
    let gate = Arc::new(ReadinessGate::new(
        pinger,
        Duration::from_millis(config.health_check.delay_ms),
        config.health_check.max_attempts,
    ));

    let shutdown = Shutdown::new();
    gate.start(shutdown.subscribe());
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "listening for connections"
    );

    let server = HttpServer::new(&config, registry, gate);
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
