//! Online logistic-regression failure model.
//!
//! Features per sample:
//! ```text
//! [response_time / 1000, cpu, memory, active_connections / 100, failed ? 1 : 0]
//! ```
//! Each training pass runs one SGD step per sample over the recency window.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::prediction::window::MetricPoint;

pub const FEATURE_COUNT: usize = 5;

/// Priors the model starts from.
pub const INITIAL_WEIGHTS: [f64; FEATURE_COUNT] = [0.3, 0.2, 0.2, 0.2, 0.1];

pub const LEARNING_RATE: f64 = 0.01;

/// Windows smaller than this are not trained on.
pub const MIN_TRAINING_POINTS: usize = 10;

pub const REASON_HIGH_RISK: &str = "High failure probability based on recent metrics";
pub const REASON_STABLE: &str = "Service appears stable";
pub const REASON_NO_MODEL: &str = "No prediction model available";

/// Weights, bias and training counter for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionModel {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
    pub training_iterations: u64,
}

impl Default for PredictionModel {
    fn default() -> Self {
        Self {
            weights: INITIAL_WEIGHTS,
            bias: 0.0,
            training_iterations: 0,
        }
    }
}

impl PredictionModel {
    /// Run one pass over `points` (oldest first).
    ///
    /// Returns false, leaving the model untouched, when there are fewer than
    /// [`MIN_TRAINING_POINTS`] points.
    pub fn train(&mut self, points: &[MetricPoint]) -> bool {
        if points.len() < MIN_TRAINING_POINTS {
            return false;
        }

        for point in points {
            let features = extract_features(point);
            let predicted = self.probability(&features);
            let label = if point.success { 0.0 } else { 1.0 };
            let error = label - predicted;

            for (weight, feature) in self.weights.iter_mut().zip(features.iter()) {
                *weight += LEARNING_RATE * error * feature;
            }
            self.bias += LEARNING_RATE * error;
        }

        self.training_iterations += 1;
        true
    }

    /// Logistic output for a feature vector.
    pub fn probability(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let z = self
            .weights
            .iter()
            .zip(features.iter())
            .fold(self.bias, |sum, (w, f)| sum + w * f);
        sigmoid(z)
    }

    /// Risk projection served by predictions.
    ///
    /// Known limitation: only the first two weights and the bias contribute,
    /// and the prediction horizon plays no part.
    pub fn risk_score(&self) -> f64 {
        (self.weights[0] * 0.5 + self.weights[1] * 0.3 + self.bias).clamp(0.0, 1.0)
    }
}

pub fn extract_features(point: &MetricPoint) -> [f64; FEATURE_COUNT] {
    [
        point.response_time / 1000.0,
        point.cpu_usage,
        point.memory_usage,
        f64::from(point.active_connections) / 100.0,
        if point.success { 0.0 } else { 1.0 },
    ]
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Outcome of a failure prediction query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub service_id: String,
    pub risk_score: f64,
    pub reason: String,
    pub action_required: bool,
    pub timestamp: DateTime<Utc>,
}

impl PredictionResult {
    pub fn from_model(service_id: &str, model: &PredictionModel, threshold: f64) -> Self {
        let risk_score = model.risk_score();
        let action_required = risk_score > threshold;
        let reason = if action_required {
            REASON_HIGH_RISK
        } else {
            REASON_STABLE
        };
        Self {
            service_id: service_id.to_string(),
            risk_score,
            reason: reason.to_string(),
            action_required,
            timestamp: Utc::now(),
        }
    }

    pub fn no_model(service_id: &str) -> Self {
        Self {
            service_id: service_id.to_string(),
            risk_score: 0.0,
            reason: REASON_NO_MODEL.to_string(),
            action_required: false,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(success: bool) -> MetricPoint {
        MetricPoint::now(250.0, success, 0.5, 0.4, 20)
    }

    #[test]
    fn test_features() {
        let f = extract_features(&MetricPoint::now(1500.0, false, 0.25, 0.75, 50));
        assert_eq!(f, [1.5, 0.25, 0.75, 0.5, 1.0]);
    }

    #[test]
    fn test_too_few_points_leave_model_untouched() {
        let mut model = PredictionModel::default();
        let points = vec![sample(false); MIN_TRAINING_POINTS - 1];
        assert!(!model.train(&points));
        assert_eq!(model, PredictionModel::default());
    }

    #[test]
    fn test_pass_applies_one_sgd_step_per_point() {
        let points: Vec<MetricPoint> = (0..MIN_TRAINING_POINTS)
            .map(|i| sample(i % 3 != 0))
            .collect();

        let mut expected = PredictionModel::default();
        for point in &points {
            let features = extract_features(point);
            let label = if point.success { 0.0 } else { 1.0 };
            let error = label - expected.probability(&features);
            for (w, f) in expected.weights.iter_mut().zip(features.iter()) {
                *w += LEARNING_RATE * error * f;
            }
            expected.bias += LEARNING_RATE * error;
        }

        let mut model = PredictionModel::default();
        assert!(model.train(&points));
        assert_eq!(model.weights, expected.weights);
        assert_eq!(model.bias, expected.bias);
        assert_eq!(model.training_iterations, 1);
    }

    #[test]
    fn test_successes_pull_risk_down_failures_push_it_up() {
        let mut healthy = PredictionModel::default();
        let mut failing = PredictionModel::default();
        let baseline = healthy.risk_score();
        for _ in 0..20 {
            healthy.train(&vec![sample(true); 50]);
            failing.train(&vec![sample(false); 50]);
        }
        assert!(healthy.risk_score() < baseline);
        assert!(failing.risk_score() > baseline);
    }

    #[test]
    fn test_risk_uses_first_two_weights_and_bias_only() {
        let mut model = PredictionModel::default();
        assert!((model.risk_score() - 0.21).abs() < 1e-12);

        model.weights[2] = 50.0;
        model.weights[3] = -50.0;
        model.weights[4] = 50.0;
        assert!((model.risk_score() - 0.21).abs() < 1e-12);

        model.bias = 5.0;
        assert_eq!(model.risk_score(), 1.0);
        model.bias = -5.0;
        assert_eq!(model.risk_score(), 0.0);
    }

    #[test]
    fn test_result_threshold() {
        let mut model = PredictionModel::default();
        let stable = PredictionResult::from_model("svc", &model, 0.7);
        assert!(!stable.action_required);
        assert_eq!(stable.reason, REASON_STABLE);
        assert_eq!(stable.service_id, "svc");

        model.bias = 0.6;
        let risky = PredictionResult::from_model("svc", &model, 0.7);
        assert!(risky.action_required);
        assert_eq!(risky.reason, REASON_HIGH_RISK);
    }
}
