//! Inbound header filtering.
//!
//! # Responsibilities
//! - Keep only whitelisted inbound headers on forwarded requests
//! - Merge operator-configured custom headers, which win on conflict
//!
//! # Design Decisions
//! - Total function: absent headers are omitted, unrepresentable custom
//!   headers are dropped, nothing fails
//! - Whitelist matching is case-insensitive

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Produce the outbound header map for a forwarded request.
///
/// `whitelist` holds lower-cased header names (the cluster config builder
/// normalizes them); `custom` holds operator-configured overrides.
pub fn filter_headers(
    inbound: &HeaderMap,
    whitelist: &[String],
    custom: &HashMap<String, String>,
) -> HeaderMap {
    let mut outbound = HeaderMap::new();

    for name in whitelist {
        if let Ok(name) = HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes()) {
            for value in inbound.get_all(&name) {
                outbound.append(name.clone(), value.clone());
            }
        }
    }

    for (name, value) in custom {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            // insert, not append: custom headers replace whatever the
            // client sent under the same name
            outbound.insert(name, value);
        }
    }

    outbound
}
