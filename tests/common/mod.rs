//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tokio::net::TcpListener;

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path_and_query: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A spawned mock backend and everything it observed.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a mock backend answering every request with a fixed status and
/// body. A `sleep_ms=N` query parameter delays the response, letting
/// tests trigger upstream timeouts.
#[allow(dead_code)]
pub async fn spawn_backend(status: StatusCode, body: &'static str) -> MockBackend {
    let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
    let recorded = Arc::clone(&requests);

    let app = Router::new().fallback(move |request: Request<Body>| {
        let recorded = Arc::clone(&recorded);
        async move {
            let (parts, request_body) = request.into_parts();
            let bytes = axum::body::to_bytes(request_body, usize::MAX)
                .await
                .unwrap_or_default();

            let path_and_query = parts
                .uri
                .path_and_query()
                .map(|pq| pq.to_string())
                .unwrap_or_else(|| parts.uri.path().to_string());

            if let Some(query) = parts.uri.query() {
                for pair in query.split('&') {
                    if let Some(ms) = pair.strip_prefix("sleep_ms=") {
                        if let Ok(ms) = ms.parse::<u64>() {
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                        }
                    }
                }
            }

            recorded.lock().unwrap().push(RecordedRequest {
                method: parts.method.to_string(),
                path_and_query,
                headers: parts
                    .headers
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.to_string(),
                            String::from_utf8_lossy(v.as_bytes()).to_string(),
                        )
                    })
                    .collect(),
                body: bytes.to_vec(),
            });

            (
                status,
                [
                    (header::CONTENT_TYPE, "application/json"),
                    // must never reach the proxy's caller
                    (header::HeaderName::from_static("x-internal-node"), "node-1"),
                ],
                body,
            )
                .into_response()
        }
    });

    serve(app, requests).await
}

/// Start a mock backend that answers 503 for the first `failures`
/// requests and 200 afterwards.
#[allow(dead_code)]
pub async fn spawn_flaky_backend(failures: u32) -> MockBackend {
    let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
    let recorded = Arc::clone(&requests);
    let seen = Arc::new(AtomicU32::new(0));

    let app = Router::new().fallback(move |request: Request<Body>| {
        let recorded = Arc::clone(&recorded);
        let seen = Arc::clone(&seen);
        async move {
            let (parts, _) = request.into_parts();
            recorded.lock().unwrap().push(RecordedRequest {
                method: parts.method.to_string(),
                path_and_query: parts.uri.path().to_string(),
                headers: Vec::new(),
                body: Vec::new(),
            });

            let call = seen.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= failures {
                (StatusCode::SERVICE_UNAVAILABLE, "{\"status\":\"starting\"}")
            } else {
                (StatusCode::OK, "{\"status\":\"yellow\"}")
            }
        }
    });

    serve(app, requests).await
}

async fn serve(app: Router, requests: Arc<Mutex<Vec<RecordedRequest>>>) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockBackend { addr, requests }
}
