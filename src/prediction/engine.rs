//! Failure prediction engine.
//!
//! # Responsibilities
//! - Keep a bounded telemetry window per service
//! - Train the service's model on every recorded sample
//! - Answer risk queries
//!
//! # Design Decisions
//! - One mutex per service for the window and one for the model; unrelated
//!   services never contend
//! - The window lock is released before training starts

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use dashmap::DashMap;

use crate::config::PredictionConfig;
use crate::prediction::model::{PredictionModel, PredictionResult};
use crate::prediction::window::{MetricPoint, ServiceMetrics};

/// Owns per-service telemetry and models.
pub struct FailurePredictionEngine {
    metrics: DashMap<String, Arc<Mutex<ServiceMetrics>>>,
    models: DashMap<String, Arc<Mutex<PredictionModel>>>,
    window: Duration,
    risk_threshold: f64,
}

impl Default for FailurePredictionEngine {
    fn default() -> Self {
        Self::new(&PredictionConfig::default())
    }
}

impl FailurePredictionEngine {
    pub fn new(config: &PredictionConfig) -> Self {
        let minutes = i64::try_from(config.window_size_minutes).unwrap_or(i64::MAX);
        Self {
            metrics: DashMap::new(),
            models: DashMap::new(),
            window: Duration::try_minutes(minutes).unwrap_or_else(|| Duration::minutes(10)),
            risk_threshold: config.failure_threshold,
        }
    }

    /// Record one request or probe outcome and run a training step.
    pub fn record_metric(
        &self,
        service_id: &str,
        response_time: f64,
        success: bool,
        cpu_usage: f64,
        memory_usage: f64,
        active_connections: u32,
    ) {
        let point = MetricPoint::now(
            response_time,
            success,
            cpu_usage,
            memory_usage,
            active_connections,
        );
        self.record_point(service_id, point);
    }

    /// Record a pre-built sample and run a training step.
    pub fn record_point(&self, service_id: &str, point: MetricPoint) {
        let window = self.window_for(service_id);
        let recent = {
            let mut metrics = lock(&window);
            metrics.push(point);
            metrics.recent_points(self.window, Utc::now())
        };

        let model = self.model_for(service_id);
        let mut model = lock(&model);
        if model.train(&recent) && model.training_iterations % 100 == 0 {
            tracing::info!(
                service = %service_id,
                training_iterations = model.training_iterations,
                "Updated prediction model"
            );
        }
    }

    /// Predict failure risk for a service.
    ///
    /// `horizon_minutes` is accepted for interface stability but does not
    /// influence the score.
    pub fn predict_failure(&self, service_id: &str, horizon_minutes: u32) -> PredictionResult {
        let Some(model) = self.models.get(service_id).map(|m| m.clone()) else {
            return PredictionResult::no_model(service_id);
        };
        let model = lock(&model);
        let result = PredictionResult::from_model(service_id, &model, self.risk_threshold);
        tracing::trace!(
            service = %service_id,
            horizon_minutes,
            risk = result.risk_score,
            "Failure prediction computed"
        );
        result
    }

    /// Copy of the service's current window, oldest first.
    pub fn points(&self, service_id: &str) -> Vec<MetricPoint> {
        self.metrics
            .get(service_id)
            .map(|window| lock(&window).iter().copied().collect())
            .unwrap_or_default()
    }

    /// Copy of the service's current model.
    pub fn model(&self, service_id: &str) -> Option<PredictionModel> {
        self.models.get(service_id).map(|model| lock(&model).clone())
    }

    fn window_for(&self, service_id: &str) -> Arc<Mutex<ServiceMetrics>> {
        if let Some(window) = self.metrics.get(service_id) {
            return window.clone();
        }
        self.metrics
            .entry(service_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ServiceMetrics::new())))
            .clone()
    }

    fn model_for(&self, service_id: &str) -> Arc<Mutex<PredictionModel>> {
        if let Some(model) = self.models.get(service_id) {
            return model.clone();
        }
        self.models
            .entry(service_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PredictionModel::default())))
            .clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
