//! Readiness gating for the backend.
//!
//! # State Transitions
//! ```text
//! not-started → probing → ready            (a probe succeeded)
//!               probing → probing          (failed probe, fixed delay)
//!               probing → failed           (optional attempt cap hit)
//! ```
//!
//! # Design Decisions
//! - Only the admin cluster is probed; reaching it stands in for "the
//!   backend is up at all"
//! - Unbounded retry by default; the attempt cap is opt-in configuration
//! - One writer (the probe loop), any number of waiters

pub mod gate;
pub mod pinger;

pub use gate::{ReadinessError, ReadinessGate, ReadinessPhase, ReadinessState};
pub use pinger::{AdminClusterPinger, Pinger, ProbeFailure};
