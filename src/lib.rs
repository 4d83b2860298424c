//! Search Cluster Broker
//!
//! Brokers application access to a backend search cluster split into a
//! "data" role (user queries) and an "admin" role (management
//! operations), and exposes a minimal reverse-proxy layer in front of it.
//!
//! # Architecture Overview
//!
//! ```text
//! configuration
//!     → cluster::config   (defaulting + validation)
//!     → cluster::registry (one live handle per role, created once)
//!     → readiness         (probe the admin cluster until reachable)
//!     → proxy             (forward fixed routes to the data cluster)
//! ```
//!
//! The proxy forwards `POST /{index}/_search` and `POST /_msearch`
//! transparently: whitelisted headers pass through, bodies are untouched,
//! and upstream failures come back as structured gateway errors.

pub mod cluster;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod readiness;

pub use cluster::{ClusterConfig, ClusterHandle, ClusterRegistry};
pub use config::BrokerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::filter_headers;
pub use readiness::ReadinessGate;
