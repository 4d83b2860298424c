//! Process lifecycle: startup sequencing and shutdown coordination.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, traffic only after wiring
//! - Subsystems initialize in dependency order, not concurrently
//! - One broadcast channel fans the shutdown signal out to every loop

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError};
