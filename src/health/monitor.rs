//! Per-instance health registry.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::HealthCheckConfig;
use crate::health::active::{ProbeResult, Prober};
use crate::health::state::ServiceHealth;
use crate::http::client::{join_url, HttpClient};
use crate::observability::metrics;

/// Owns the health state of every backend instance and probes them on demand.
pub struct HealthMonitor {
    states: DashMap<String, Arc<ServiceHealth>>,
    prober: Prober,
}

impl HealthMonitor {
    pub fn new(client: HttpClient, config: &HealthCheckConfig) -> Self {
        Self {
            states: DashMap::new(),
            prober: Prober::new(client, config),
        }
    }

    /// Probe `base_url + health_path` and fold the outcome into the instance's
    /// health. Never fails: transport errors are recorded as failures.
    pub async fn probe(&self, instance_id: &str, base_url: &str, health_path: &str) -> ProbeResult {
        let url = join_url(base_url, health_path);
        let result = self.prober.probe(&url).await;

        if result.is_success() {
            self.record_success(instance_id);
            tracing::debug!(instance = %instance_id, "Health check successful");
        } else {
            self.record_failure(instance_id);
            tracing::debug!(instance = %instance_id, result = ?result, "Health check failed");
        }
        result
    }

    pub fn record_success(&self, instance_id: &str) {
        let health = self.entry(instance_id);
        if health.record_success() {
            tracing::info!(instance = %instance_id, "Instance recovered");
        }
        metrics::record_instance_health(instance_id, true);
    }

    pub fn record_failure(&self, instance_id: &str) {
        let health = self.entry(instance_id);
        if health.record_failure() {
            tracing::warn!(
                instance = %instance_id,
                consecutive_failures = health.consecutive_failures(),
                "Instance marked unhealthy"
            );
        }
        metrics::record_instance_health(instance_id, health.is_healthy());
    }

    /// False until the instance has a health record.
    pub fn is_healthy(&self, instance_id: &str) -> bool {
        self.states
            .get(instance_id)
            .map(|health| health.is_healthy())
            .unwrap_or(false)
    }

    pub fn get_health(&self, instance_id: &str) -> Option<Arc<ServiceHealth>> {
        self.states.get(instance_id).map(|health| health.clone())
    }

    /// Success ratio, optimistic (1.0) for instances without samples.
    pub fn success_rate(&self, instance_id: &str) -> f64 {
        self.states
            .get(instance_id)
            .map(|health| health.success_rate())
            .unwrap_or(1.0)
    }

    fn entry(&self, instance_id: &str) -> Arc<ServiceHealth> {
        if let Some(health) = self.states.get(instance_id) {
            return health.clone();
        }
        self.states
            .entry(instance_id.to_string())
            .or_insert_with(|| Arc::new(ServiceHealth::new(instance_id)))
            .clone()
    }
}
