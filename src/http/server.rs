//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the proxied routes
//! - Wire up middleware (tracing, request ID, inbound timeout)
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - The registry and gate are injected, never reached as globals
//! - Proxied routes are fixed at construction; this is not a general
//!   gateway

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cluster::ClusterRegistry;
use crate::config::BrokerConfig;
use crate::proxy::handler::proxy_handler;
use crate::proxy::ProxyPolicy;
use crate::readiness::{ReadinessGate, ReadinessPhase};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ClusterRegistry>,
    pub gate: Arc<ReadinessGate>,
    pub policy: ProxyPolicy,
}

/// HTTP server for the broker.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around an already-wired registry and gate.
    pub fn new(
        config: &BrokerConfig,
        registry: Arc<ClusterRegistry>,
        gate: Arc<ReadinessGate>,
    ) -> Self {
        let state = AppState {
            registry,
            gate,
            policy: ProxyPolicy::from_config(&config.proxy),
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &BrokerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{index}/_search", post(proxy_handler))
            .route("/_msearch", post(proxy_handler))
            .route("/ready", get(ready_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Readiness introspection.
async fn ready_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.gate.state();
    let status = if snapshot.phase == ReadinessPhase::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = Json(json!({
        "state": snapshot.phase.as_str(),
        "attempts": snapshot.attempts,
    }));
    (status, body).into_response()
}
