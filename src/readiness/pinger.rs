//! Probe abstraction for the readiness gate.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::StatusCode;
use thiserror::Error;

use crate::cluster::ClusterRegistry;

/// One readiness probe attempt. Expected to fail while the backend is
/// still coming up; the gate logs and retries.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("status probe timed out")]
    Timeout,

    #[error("status endpoint answered {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("wiring error: {0}")]
    Wiring(String),
}

/// A single reachability probe against the backend.
///
/// Trait object so the gate can be driven by a scripted probe in tests.
pub trait Pinger: Send + Sync {
    fn ping(&self) -> BoxFuture<'_, Result<(), ProbeFailure>>;
}

/// Production pinger: asks the admin cluster for its status through the
/// registry. Any 2xx answer counts as reachable, everything else fails
/// the probe.
pub struct AdminClusterPinger {
    registry: Arc<ClusterRegistry>,
}

impl AdminClusterPinger {
    pub fn new(registry: Arc<ClusterRegistry>) -> Self {
        Self { registry }
    }
}

impl Pinger for AdminClusterPinger {
    fn ping(&self) -> BoxFuture<'_, Result<(), ProbeFailure>> {
        async move {
            let admin = self
                .registry
                .admin()
                .map_err(|e| ProbeFailure::Wiring(e.to_string()))?;

            match admin.status().await {
                Ok(status) if status.is_success() => Ok(()),
                Ok(status) => Err(ProbeFailure::Status(status)),
                Err(e) if e.is_timeout() => Err(ProbeFailure::Timeout),
                Err(e) => Err(ProbeFailure::Transport(e.to_string())),
            }
        }
        .boxed()
    }
}
