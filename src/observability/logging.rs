//! Structured logging.
//!
//! Uses the tracing crate throughout; `RUST_LOG` overrides the
//! configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber. Called once from main.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("search_broker={level},tower_http={level}"))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
