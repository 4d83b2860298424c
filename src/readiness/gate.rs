//! The readiness gate and its probe loop.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time;

use crate::observability::metrics;
use crate::readiness::pinger::Pinger;

/// Where the gate is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessPhase {
    NotStarted,
    Probing,
    Ready,
    Failed,
}

impl ReadinessPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessPhase::NotStarted => "not-started",
            ReadinessPhase::Probing => "probing",
            ReadinessPhase::Ready => "ready",
            ReadinessPhase::Failed => "failed",
        }
    }
}

/// Snapshot of the gate, published through a watch channel.
///
/// The probe loop is the only writer; waiters only observe.
#[derive(Debug, Clone)]
pub struct ReadinessState {
    pub phase: ReadinessPhase,
    /// Probes issued so far.
    pub attempts: u32,
    /// Wall-clock time of the first successful probe.
    pub ready_since: Option<SystemTime>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadinessError {
    /// The configured attempt cap was exhausted without a successful probe.
    #[error("backend never became reachable within the configured attempt cap")]
    ProbesExhausted,

    /// The gate stopped (shutdown) before becoming ready.
    #[error("readiness gate stopped before the backend became reachable")]
    Stopped,
}

/// Asynchronously probes the admin cluster until it responds, then stays
/// open for the rest of the process lifetime.
pub struct ReadinessGate {
    tx: watch::Sender<ReadinessState>,
    pinger: Arc<dyn Pinger>,
    delay: Duration,
    max_attempts: Option<u32>,
}

impl ReadinessGate {
    pub fn new(pinger: Arc<dyn Pinger>, delay: Duration, max_attempts: Option<u32>) -> Self {
        let (tx, _) = watch::channel(ReadinessState {
            phase: ReadinessPhase::NotStarted,
            attempts: 0,
            ready_since: None,
        });
        Self {
            tx,
            pinger,
            delay,
            max_attempts,
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> ReadinessState {
        self.tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.tx.borrow().phase == ReadinessPhase::Ready
    }

    /// Start the probe loop. Called once during startup; the loop exits
    /// on the first successful probe or on shutdown.
    pub fn start(self: &Arc<Self>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let gate = Arc::clone(self);
        tokio::spawn(async move { gate.run(shutdown).await })
    }

    /// Resolves the instant the gate becomes ready; immediately if it
    /// already is. Any number of callers share the one underlying probe
    /// loop, no extra probes are triggered per waiter.
    pub async fn wait_until_ready(&self) -> Result<(), ReadinessError> {
        let mut rx = self.tx.subscribe();
        let state = rx
            .wait_for(|s| matches!(s.phase, ReadinessPhase::Ready | ReadinessPhase::Failed))
            .await
            .map_err(|_| ReadinessError::Stopped)?;

        match state.phase {
            ReadinessPhase::Ready => Ok(()),
            _ => Err(ReadinessError::ProbesExhausted),
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        self.tx
            .send_modify(|s| s.phase = ReadinessPhase::Probing);
        metrics::record_readiness(false);

        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            self.tx.send_modify(|s| s.attempts = attempts);

            let outcome = tokio::select! {
                outcome = self.pinger.ping() => outcome,
                _ = shutdown.recv() => {
                    tracing::info!("readiness gate received shutdown signal, exiting loop");
                    return;
                }
            };

            match outcome {
                Ok(()) => {
                    self.tx.send_modify(|s| {
                        s.phase = ReadinessPhase::Ready;
                        s.ready_since = Some(SystemTime::now());
                    });
                    metrics::record_readiness(true);
                    tracing::info!(attempts, "backend reachable, readiness gate open");
                    return;
                }
                Err(e) => {
                    metrics::record_probe_failure();
                    tracing::warn!(attempt = attempts, error = %e, "readiness probe failed");

                    if let Some(cap) = self.max_attempts {
                        if attempts >= cap {
                            self.tx.send_modify(|s| s.phase = ReadinessPhase::Failed);
                            tracing::error!(
                                attempts,
                                "readiness probing gave up, attempt cap exhausted"
                            );
                            return;
                        }
                    }
                }
            }

            tokio::select! {
                _ = time::sleep(self.delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("readiness gate received shutdown signal, exiting loop");
                    return;
                }
            }
        }
    }
}
