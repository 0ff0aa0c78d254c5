//! Active health checking.
//!
//! # Responsibilities
//! - Issue a GET against an instance's health endpoint
//! - Bound every attempt with the configured timeout
//! - Retry up to the configured count before reporting a failure

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Uri};
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::http::client::HttpClient;

/// Result of a single health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The health endpoint returned 2xx.
    Healthy,
    /// The health endpoint returned non-2xx.
    Unhealthy,
    /// The probe could not be executed (connection error, timeout, bad url).
    Failed,
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeResult::Healthy)
    }
}

/// Executes HTTP health probes.
#[derive(Clone)]
pub struct Prober {
    client: HttpClient,
    timeout: Duration,
    attempts: u32,
}

impl Prober {
    pub fn new(client: HttpClient, config: &HealthCheckConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            attempts: config.retry_count.max(1),
        }
    }

    /// Probe `url`, retrying until one attempt succeeds or attempts run out.
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let mut result = ProbeResult::Failed;
        for attempt in 1..=self.attempts {
            result = self.probe_once(url).await;
            if result.is_success() {
                break;
            }
            tracing::debug!(url = %url, attempt, result = ?result, "Health probe attempt failed");
        }
        result
    }

    async fn probe_once(&self, url: &str) -> ProbeResult {
        let uri: Uri = match url.parse() {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Invalid health check url");
                return ProbeResult::Failed;
            }
        };

        let request = match Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("user-agent", "self-healing-proxy-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to build health check request");
                return ProbeResult::Failed;
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => ProbeResult::Healthy,
            Ok(Ok(response)) => {
                tracing::debug!(url = %url, status = %response.status(), "Health check failed: non-success status");
                ProbeResult::Unhealthy
            }
            Ok(Err(e)) => {
                tracing::debug!(url = %url, error = %e, "Health check failed: connection error");
                ProbeResult::Failed
            }
            Err(_) => {
                tracing::debug!(url = %url, timeout = ?self.timeout, "Health check failed: timeout");
                ProbeResult::Failed
            }
        }
    }
}
