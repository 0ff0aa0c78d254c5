//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

use self_healing_proxy::config::{FallbackStrategy, HealthCheckConfig};
use self_healing_proxy::healing::{Forwarder, SelfHealingRouteManager};
use self_healing_proxy::health::HealthMonitor;
use self_healing_proxy::http::build_client;
use self_healing_proxy::load_balancer::{InstanceDefinition, ServiceDefinition, ServiceRegistry};
use self_healing_proxy::prediction::FailurePredictionEngine;
use self_healing_proxy::resilience::BackoffPolicy;

#[derive(Clone)]
struct BackendState {
    name: &'static str,
    status: Arc<AtomicU16>,
    hits: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

/// A loopback HTTP backend that describes every request it receives.
///
/// Replies with the configured status and a JSON body
/// `{backend, method, path, headers, body}`. Every response also carries
/// `x-backend: <name>` and `x-forwarded: from-backend`.
pub struct MockBackend {
    pub addr: SocketAddr,
    status: Arc<AtomicU16>,
    hits: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub async fn start(name: &'static str) -> Self {
        Self::start_with_status(name, 200).await
    }

    pub async fn start_with_status(name: &'static str, status: u16) -> Self {
        let state = BackendState {
            name,
            status: Arc::new(AtomicU16::new(status)),
            hits: Arc::new(AtomicUsize::new(0)),
            paths: Arc::new(Mutex::new(Vec::new())),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(describe).with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            status: state.status,
            hits: state.hits,
            paths: state.paths,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Path and query of every request received, in order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

async fn describe(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    state.paths.lock().unwrap().push(path.clone());

    let received: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let status = StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap();
    let body = json!({
        "backend": state.name,
        "method": method.as_str(),
        "path": path,
        "headers": received,
        "body": String::from_utf8_lossy(&body),
    });

    (
        status,
        [("x-backend", state.name), ("x-forwarded", "from-backend")],
        axum::Json(body),
    )
        .into_response()
}

/// An address nothing listens on.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn closed_url() -> String {
    format!("http://{}", closed_addr())
}

pub fn instance(id: &str, url: &str) -> InstanceDefinition {
    InstanceDefinition::new(id, url, 100)
}

pub fn service(id: &str, path: &str, instances: Vec<InstanceDefinition>, strategy: FallbackStrategy) -> ServiceDefinition {
    ServiceDefinition::new(id, path, instances, strategy)
}

/// Fast backoff so retry fallbacks finish within a test.
pub fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy {
        max_attempts: 3,
        base_delay_ms: 20,
        max_delay_ms: 100,
    }
}

pub fn health_config() -> HealthCheckConfig {
    HealthCheckConfig {
        timeout_secs: 2,
        retry_count: 1,
        ..HealthCheckConfig::default()
    }
}

pub fn manager(services: Vec<ServiceDefinition>) -> SelfHealingRouteManager {
    let client = build_client();
    SelfHealingRouteManager::new(
        Arc::new(ServiceRegistry::new(services)),
        Arc::new(HealthMonitor::new(client.clone(), &health_config())),
        Arc::new(FailurePredictionEngine::default()),
        Forwarder::new(client, Duration::from_secs(2), 1024 * 1024),
    )
    .with_backoff(fast_backoff())
}

/// Record enough successes to make an instance healthy.
pub fn mark_healthy(manager: &SelfHealingRouteManager, instance_id: &str) {
    manager.health().record_success(instance_id);
}

/// Record enough consecutive failures to make an instance unhealthy.
pub fn mark_unhealthy(manager: &SelfHealingRouteManager, instance_id: &str) {
    for _ in 0..3 {
        manager.health().record_failure(instance_id);
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

pub fn get(path: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder().uri(path).body(Body::empty()).unwrap()
}
