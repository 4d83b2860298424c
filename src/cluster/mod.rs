//! Cluster access subsystem.
//!
//! # Data Flow
//! ```text
//! ClusterSettings (raw, from config file)
//!     → config.rs (defaulting + validation → ClusterConfig)
//!     → handle.rs (one live client per role)
//!     → registry.rs (name → handle, created once, read many)
//! ```
//!
//! # Design Decisions
//! - ClusterConfig is an immutable value type; building it is pure
//! - Handles are created once per role at startup and never evicted
//! - The registry is dependency-injected, not ambient global state

pub mod config;
pub mod handle;
pub mod registry;

pub use config::ClusterConfig;
pub use handle::ClusterHandle;
pub use registry::{ClusterRegistry, RegistryError};

/// Role name of the cluster serving user queries.
pub const DATA_CLUSTER: &str = "data";

/// Role name of the cluster serving management operations.
pub const ADMIN_CLUSTER: &str = "admin";

/// Role name of the optional secondary cluster.
pub const TRIBE_CLUSTER: &str = "tribe";
