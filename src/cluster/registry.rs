//! Connection registry: one live handle per cluster role.
//!
//! # Responsibilities
//! - Create and cache handles by role name
//! - Hand out shared handles to the gate and the proxy
//!
//! # Design Decisions
//! - Created once during single-threaded startup, read many afterwards;
//!   the lock is only ever contended if that contract is broken
//! - Re-creating a name is an error, never a silent swap of a live
//!   connection pool
//! - Passed around explicitly (Arc), not process-global

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::cluster::config::ClusterConfig;
use crate::cluster::handle::ClusterHandle;
use crate::cluster::{ADMIN_CLUSTER, DATA_CLUSTER};
use crate::config::ConfigError;

/// Process-wide mapping from role name to live cluster handle.
#[derive(Default)]
pub struct ClusterRegistry {
    clusters: RwLock<HashMap<String, Arc<ClusterHandle>>>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Wiring bug: the same role was registered twice.
    #[error("cluster \"{0}\" is already registered")]
    DuplicateCluster(String),

    /// Wiring bug: a role was requested that was never registered.
    #[error("unknown cluster \"{0}\"")]
    UnknownCluster(String),

    /// The handle's client could not be constructed.
    #[error(transparent)]
    Client(#[from] ConfigError),
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct and cache a handle for `name`.
    ///
    /// Opens no network connection; the client's pool connects lazily.
    /// Fails if `name` is already registered, leaving the existing handle
    /// untouched.
    pub fn create(
        &self,
        name: &str,
        config: ClusterConfig,
    ) -> Result<Arc<ClusterHandle>, RegistryError> {
        let mut clusters = self.clusters.write().unwrap_or_else(|e| e.into_inner());
        if clusters.contains_key(name) {
            return Err(RegistryError::DuplicateCluster(name.to_string()));
        }

        let handle = Arc::new(ClusterHandle::new(config)?);
        clusters.insert(name.to_string(), Arc::clone(&handle));
        tracing::info!(cluster = name, url = %handle.config().url, "cluster registered");
        Ok(handle)
    }

    /// Return the cached handle for `name`.
    pub fn get(&self, name: &str) -> Result<Arc<ClusterHandle>, RegistryError> {
        self.clusters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownCluster(name.to_string()))
    }

    /// The cluster serving user queries.
    pub fn data(&self) -> Result<Arc<ClusterHandle>, RegistryError> {
        self.get(DATA_CLUSTER)
    }

    /// The cluster serving management operations.
    pub fn admin(&self) -> Result<Arc<ClusterHandle>, RegistryError> {
        self.get(ADMIN_CLUSTER)
    }
}
