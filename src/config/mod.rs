//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! broker.toml
//!     → loader.rs (read, parse)
//!     → schema.rs (raw serde shape, defaults)
//!     → cluster::config (defaulting + validation → ClusterConfig)
//! ```
//!
//! # Design Decisions
//! - Serde handles syntax; semantic validation happens in the cluster
//!   config builder before any handle is constructed
//! - Startup-time configuration errors are fatal

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    BrokerConfig, ClusterSettings, ClustersConfig, HealthCheckConfig, ListenerConfig,
    ObservabilityConfig, ProxyPolicyConfig, RequestDefaults, SslSettings, VerificationMode,
};

use std::path::PathBuf;
use thiserror::Error;

/// Error type for configuration loading and cluster config building.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cluster \"{cluster}\" has an invalid url {url:?}: {reason}")]
    InvalidUrl {
        cluster: String,
        url: String,
        reason: String,
    },

    #[error("cluster \"{cluster}\" has contradictory ssl settings: {reason}")]
    SslMaterial { cluster: String, reason: String },

    #[error("cluster \"{cluster}\" could not read {path:?}: {source}")]
    SslFile {
        cluster: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cluster \"{cluster}\" has an invalid custom header {name:?}")]
    InvalidHeader { cluster: String, name: String },

    #[error("cluster \"{cluster}\" client could not be built: {reason}")]
    Client { cluster: String, reason: String },
}
