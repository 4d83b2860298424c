//! The proxy request handler.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::cluster::handle::ForwardError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::headers::filter_headers;

/// Per-request proxy failure, surfaced to the caller as a structured
/// gateway error. Never affects other in-flight requests.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("backend is not ready yet")]
    NotReady,

    #[error("request body could not be read: {0}")]
    BodyRead(String),

    #[error("request path could not be forwarded: {0}")]
    BadPath(String),

    #[error("timed out waiting for the backend")]
    Timeout,

    #[error("could not connect to the backend: {0}")]
    Connect(String),

    #[error("backend transport error: {0}")]
    Transport(String),
}

impl UpstreamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            UpstreamError::BodyRead(_) => StatusCode::BAD_REQUEST,
            UpstreamError::BadPath(_) => StatusCode::BAD_REQUEST,
            UpstreamError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Connect(_) => StatusCode::BAD_GATEWAY,
            UpstreamError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            UpstreamError::NotReady => "NOT_READY",
            UpstreamError::BodyRead(_) => "BAD_REQUEST_BODY",
            UpstreamError::BadPath(_) => "BAD_REQUEST_PATH",
            UpstreamError::Timeout => "GATEWAY_TIMEOUT",
            UpstreamError::Connect(_) => "UPSTREAM_UNREACHABLE",
            UpstreamError::Transport(_) => "UPSTREAM_ERROR",
        }
    }
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        }));
        (status, body).into_response()
    }
}

/// Entry point for proxied routes.
///
/// Registered for the two built-in routes; reusable for any additional
/// (method, path) pair that should forward to the data cluster.
pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let response = match proxy_to_data(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %route,
                error = %e,
                "proxied request failed"
            );
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &route, start);
    response
}

async fn proxy_to_data(
    state: &AppState,
    request: Request<Body>,
) -> Result<Response, UpstreamError> {
    // Policy: reject before readiness instead of forwarding into a
    // possibly-down backend.
    if !state.gate.is_ready() {
        return Err(UpstreamError::NotReady);
    }
    let data = state.registry.data().map_err(|_| UpstreamError::NotReady)?;
    let config = data.config();

    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.policy.max_body_bytes)
        .await
        .map_err(|e| UpstreamError::BodyRead(e.to_string()))?;

    let headers = filter_headers(
        &parts.headers,
        &config.request_headers_whitelist,
        &config.custom_headers,
    );

    let path_and_query = forward_path(
        parts.uri.path(),
        parts.uri.query(),
        config.shard_timeout,
    );

    let upstream = data
        .forward(parts.method, &path_and_query, headers, body.into())
        .await
        .map_err(classify)?;

    let status = upstream.status();
    let mut relayed = HeaderMap::new();
    for name in state.policy.response_headers.iter() {
        for value in upstream.headers().get_all(name) {
            relayed.append(name.clone(), value.clone());
        }
    }

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = relayed;
    Ok(response)
}

/// Rebuild the outbound path and query, injecting the configured shard
/// timeout when the route accepts one and the client did not already
/// pass its own.
fn forward_path(path: &str, query: Option<&str>, shard_timeout: Duration) -> String {
    let client_set_timeout = query
        .map(|q| {
            q.split('&')
                .any(|pair| pair.split('=').next() == Some("timeout"))
        })
        .unwrap_or(false);

    let mut out = path.to_string();
    if let Some(query) = query {
        out.push('?');
        out.push_str(query);
    }

    if !shard_timeout.is_zero() && !client_set_timeout {
        out.push(if query.is_some() { '&' } else { '?' });
        out.push_str(&format!("timeout={}ms", shard_timeout.as_millis()));
    }

    out
}

fn classify(err: ForwardError) -> UpstreamError {
    match err {
        ForwardError::Path { .. } => UpstreamError::BadPath(err.to_string()),
        ForwardError::Http(e) if e.is_timeout() => UpstreamError::Timeout,
        ForwardError::Http(e) if e.is_connect() => UpstreamError::Connect(e.to_string()),
        ForwardError::Http(e) => UpstreamError::Transport(e.to_string()),
    }
}
