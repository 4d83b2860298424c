//! End-to-end proxy scenarios against a mock search backend.

mod common;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::net::TcpListener;

use common::{spawn_backend, MockBackend};
use search_broker::cluster::{ClusterConfig, ClusterRegistry, ADMIN_CLUSTER, DATA_CLUSTER};
use search_broker::config::{BrokerConfig, ClusterSettings};
use search_broker::readiness::{AdminClusterPinger, ReadinessGate};
use search_broker::{HttpServer, Shutdown};

struct Broker {
    addr: SocketAddr,
    gate: Arc<ReadinessGate>,
    shutdown: Shutdown,
}

impl Broker {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn broker_config(data_url: &str, admin_url: &str) -> BrokerConfig {
    let mut config = BrokerConfig::default();
    config.clusters.data = ClusterSettings {
        url: data_url.to_string(),
        request_timeout_ms: Some(500),
        shard_timeout_ms: Some(100),
        custom_headers: HashMap::from([("x-proxy-tenant".to_string(), "acme".to_string())]),
        ..Default::default()
    };
    config.clusters.admin.url = admin_url.to_string();
    config.health_check.delay_ms = 10;
    config
}

async fn start_broker(config: BrokerConfig) -> Broker {
    let registry = Arc::new(ClusterRegistry::new());
    registry
        .create(
            DATA_CLUSTER,
            ClusterConfig::build(DATA_CLUSTER, &config.clusters.data, &config.defaults).unwrap(),
        )
        .unwrap();
    registry
        .create(
            ADMIN_CLUSTER,
            ClusterConfig::build(ADMIN_CLUSTER, &config.clusters.admin, &config.defaults).unwrap(),
        )
        .unwrap();

    let pinger = Arc::new(AdminClusterPinger::new(Arc::clone(&registry)));
    let gate = Arc::new(ReadinessGate::new(
        pinger,
        Duration::from_millis(config.health_check.delay_ms),
        config.health_check.max_attempts,
    ));
    let shutdown = Shutdown::new();
    gate.start(shutdown.subscribe());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config, registry, Arc::clone(&gate));
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    Broker {
        addr,
        gate,
        shutdown,
    }
}

fn forwarded_to(backend: &MockBackend, path: &str) -> Option<common::RecordedRequest> {
    backend
        .requests()
        .into_iter()
        .find(|r| r.path_and_query.starts_with(path))
}

#[tokio::test]
async fn msearch_is_forwarded_with_filtered_headers() {
    let backend = spawn_backend(StatusCode::OK, "{\"responses\":[]}").await;
    let broker = start_broker(broker_config(&backend.url(), &backend.url())).await;
    broker.gate.wait_until_ready().await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(broker.url("/_msearch"))
        .header("authorization", "Bearer x")
        .header("x-evil", "y")
        .body("{}\n{\"query\":{\"match_all\":{}}}\n")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    // Backend-internal headers stay behind the proxy.
    assert!(response.headers().get("x-internal-node").is_none());
    assert_eq!(response.text().await.unwrap(), "{\"responses\":[]}");

    let forwarded = forwarded_to(&backend, "/_msearch").expect("request never reached backend");
    assert_eq!(forwarded.method, "POST");
    assert_eq!(forwarded.path_and_query, "/_msearch?timeout=100ms");
    assert_eq!(forwarded.header("authorization"), Some("Bearer x"));
    assert_eq!(forwarded.header("x-evil"), None);
    assert_eq!(forwarded.header("x-proxy-tenant"), Some("acme"));
    assert_eq!(forwarded.body, b"{}\n{\"query\":{\"match_all\":{}}}\n".to_vec());
}

#[tokio::test]
async fn search_route_preserves_path_and_query() {
    let backend = spawn_backend(StatusCode::OK, "{\"hits\":{\"total\":0}}").await;
    let broker = start_broker(broker_config(&backend.url(), &backend.url())).await;
    broker.gate.wait_until_ready().await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(broker.url("/logs/_search?pretty=true"))
        .body("{\"query\":{\"match_all\":{}}}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let forwarded =
        forwarded_to(&backend, "/logs/_search").expect("request never reached backend");
    assert_eq!(
        forwarded.path_and_query,
        "/logs/_search?pretty=true&timeout=100ms"
    );
}

#[tokio::test]
async fn upstream_status_codes_are_relayed() {
    let backend = spawn_backend(
        StatusCode::NOT_FOUND,
        "{\"error\":{\"type\":\"index_not_found_exception\"}}",
    )
    .await;
    // A separate healthy admin cluster, so only the data role answers 404.
    let admin = spawn_backend(StatusCode::OK, "{\"status\":\"green\"}").await;
    let broker = start_broker(broker_config(&backend.url(), &admin.url())).await;
    broker.gate.wait_until_ready().await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(broker.url("/missing/_search"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("index_not_found"));
}

#[tokio::test]
async fn upstream_timeout_maps_to_504_and_later_requests_recover() {
    let backend = spawn_backend(StatusCode::OK, "{\"responses\":[]}").await;
    let broker = start_broker(broker_config(&backend.url(), &backend.url())).await;
    broker.gate.wait_until_ready().await.unwrap();

    let client = reqwest::Client::new();

    // Backend sleeps past the 500ms upstream request timeout.
    let slow = client
        .post(broker.url("/logs/_search?sleep_ms=2000"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(slow.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: serde_json::Value = slow.json().await.unwrap();
    assert_eq!(body["error"]["code"], "GATEWAY_TIMEOUT");
    assert_eq!(body["error"]["status"], 504);

    // The failure was isolated to that request.
    let ok = client
        .post(broker.url("/_msearch"))
        .body("{}\n{}\n")
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn requests_are_rejected_while_the_gate_is_closed() {
    let backend = spawn_backend(StatusCode::OK, "{}").await;
    // Admin cluster unreachable: the gate never opens.
    let broker = start_broker(broker_config(&backend.url(), "http://127.0.0.1:1")).await;

    let client = reqwest::Client::new();
    let response = client
        .post(broker.url("/_msearch"))
        .body("{}\n{}\n")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_READY");

    // Nothing was forwarded to the data cluster.
    assert!(forwarded_to(&backend, "/_msearch").is_none());

    let ready = client.get(broker.url("/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn ready_endpoint_reports_the_open_gate() {
    let backend = spawn_backend(StatusCode::OK, "{}").await;
    let broker = start_broker(broker_config(&backend.url(), &backend.url())).await;
    broker.gate.wait_until_ready().await.unwrap();

    let client = reqwest::Client::new();
    let ready = client.get(broker.url("/ready")).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    let body: serde_json::Value = ready.json().await.unwrap();
    assert_eq!(body["state"], "ready");
}
