//! Transparent request proxying to the data cluster.
//!
//! # Data Flow
//! ```text
//! Inbound request (fixed routes: POST /{index}/_search, POST /_msearch)
//!     → readiness check (503 while the gate is closed)
//!     → headers.rs (whitelist filter + operator custom headers)
//!     → registry "data" handle (body and query forwarded verbatim,
//!       shard timeout injected)
//!     → relay status + body, response headers through an allow-list
//! ```
//!
//! # Design Decisions
//! - Transparent: no query rewriting, body passes through untouched
//! - Upstream failures are isolated per request and answered with a
//!   structured gateway error
//! - Response headers default to a small allow-list so backend topology
//!   details never reach the client

pub mod handler;
pub mod headers;

pub use handler::{proxy_handler, UpstreamError};
pub use headers::filter_headers;

use axum::http::HeaderName;
use std::sync::Arc;

use crate::config::ProxyPolicyConfig;

/// Runtime relay policy, parsed once at startup.
#[derive(Clone)]
pub struct ProxyPolicy {
    /// Upstream response headers relayed to the client.
    pub response_headers: Arc<Vec<HeaderName>>,
    /// Maximum buffered inbound body size.
    pub max_body_bytes: usize,
}

impl ProxyPolicy {
    pub fn from_config(config: &ProxyPolicyConfig) -> Self {
        let mut response_headers = Vec::with_capacity(config.response_headers_allowlist.len());
        for name in &config.response_headers_allowlist {
            match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => response_headers.push(name),
                Err(_) => {
                    tracing::warn!(header = %name, "ignoring invalid response header in allowlist")
                }
            }
        }
        Self {
            response_headers: Arc::new(response_headers),
            max_body_bytes: config.max_body_bytes,
        }
    }
}
