//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers: trace, request ID, timeout)
//!     → proxy::handler (fixed forwarded routes)
//!     → /ready (readiness introspection)
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
