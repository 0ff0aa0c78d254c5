//! Periodic background work.
//!
//! # Data Flow
//! ```text
//! health ticker (health_check.interval_secs)
//!     → one task per instance → HealthMonitor::probe
//!
//! prediction ticker (prediction.interval_secs)
//!     → one task per prediction-enabled service → predict_failure
//!     → alert + risk gauge when action is required
//! ```
//!
//! # Design Decisions
//! - Both loops are independent of each other and of the request path
//! - A batch never stops because one item failed or panicked
//! - Loops end on the shutdown broadcast

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::{HealthCheckConfig, PredictionConfig};
use crate::health::{HealthMonitor, ProbeResult};
use crate::lifecycle::Shutdown;
use crate::load_balancer::ServiceRegistry;
use crate::observability::metrics;
use crate::prediction::{FailurePredictionEngine, PredictionResult};

/// Outcome of probing one instance during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub instance_id: String,
    pub result: ProbeResult,
}

pub struct Scheduler {
    registry: Arc<ServiceRegistry>,
    health: Arc<HealthMonitor>,
    predictions: Arc<FailurePredictionEngine>,
    health_config: HealthCheckConfig,
    prediction_config: PredictionConfig,
}

impl Scheduler {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        health: Arc<HealthMonitor>,
        predictions: Arc<FailurePredictionEngine>,
        health_config: HealthCheckConfig,
        prediction_config: PredictionConfig,
    ) -> Self {
        Self {
            registry,
            health,
            predictions,
            health_config,
            prediction_config,
        }
    }

    /// Spawn the enabled loops. Each stops when `shutdown` fires.
    pub fn start(self: Arc<Self>, shutdown: &Shutdown) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(2);

        if self.health_config.enabled {
            let scheduler = self.clone();
            let rx = shutdown.subscribe();
            handles.push(tokio::spawn(async move { scheduler.health_loop(rx).await }));
        } else {
            tracing::info!("Active health checks disabled");
        }

        if self.prediction_config.enabled {
            let scheduler = self.clone();
            let rx = shutdown.subscribe();
            handles.push(tokio::spawn(async move { scheduler.prediction_loop(rx).await }));
        } else {
            tracing::info!("Failure prediction disabled");
        }

        handles
    }

    async fn health_loop(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.health_config.interval_secs,
            path = %self.health_config.path,
            "Health check scheduler starting"
        );
        let mut ticker = ticker(self.health_config.interval_secs);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_health_checks().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health check scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn prediction_loop(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.prediction_config.interval_secs,
            "Prediction scheduler starting"
        );
        let mut ticker = ticker(self.prediction_config.interval_secs);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_predictions().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Prediction scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every configured instance concurrently and wait for the batch.
    pub async fn run_health_checks(&self) -> Vec<ProbeOutcome> {
        tracing::debug!("Starting scheduled health checks");

        let mut tasks = Vec::new();
        for (_, instance) in self.registry.all_instances() {
            let health = self.health.clone();
            let path = self.health_config.path.clone();
            let instance_id = instance.id.clone();
            let task = tokio::spawn(async move {
                health.probe(&instance.id, &instance.url, &path).await
            });
            tasks.push((instance_id, task));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (instance_id, task) in tasks {
            match task.await {
                Ok(result) => {
                    tracing::debug!(instance = %instance_id, result = ?result, "Health check completed");
                    outcomes.push(ProbeOutcome { instance_id, result });
                }
                Err(e) => {
                    tracing::error!(instance = %instance_id, error = %e, "Health check task failed");
                }
            }
        }

        tracing::debug!(checked = outcomes.len(), "All health checks completed");
        outcomes
    }

    /// Evaluate every prediction-enabled service and raise alerts.
    pub async fn run_predictions(&self) -> Vec<PredictionResult> {
        tracing::debug!("Starting failure predictions");
        let horizon = self.prediction_config.horizon_minutes;

        let mut tasks = Vec::new();
        for service in self.registry.services() {
            if !service.prediction_enabled {
                continue;
            }
            let engine = self.predictions.clone();
            let service_id = service.id.clone();
            let task = tokio::spawn(async move { engine.predict_failure(&service_id, horizon) });
            tasks.push((service.id.clone(), task));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (service_id, task) in tasks {
            let prediction = match task.await {
                Ok(prediction) => prediction,
                Err(e) => {
                    tracing::error!(service = %service_id, error = %e, "Prediction failed");
                    continue;
                }
            };

            metrics::record_failure_risk(&service_id, prediction.risk_score);
            if prediction.action_required {
                tracing::warn!(
                    service = %service_id,
                    risk = %format!("{:.2}", prediction.risk_score),
                    reason = %prediction.reason,
                    "Prediction alert"
                );
                tracing::info!(
                    service = %service_id,
                    risk = %format!("{:.2}", prediction.risk_score),
                    "Triggering preventive actions"
                );
            }
            results.push(prediction);
        }

        tracing::debug!(evaluated = results.len(), "All failure predictions completed");
        results
    }
}

/// Interval that waits a full period after a batch overruns instead of bursting.
fn ticker(interval_secs: u64) -> time::Interval {
    let mut ticker = time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
