//! Instance health state machine.
//!
//! # States
//! - Healthy: instance is eligible for selection and redirection
//! - Unhealthy: instance is skipped (unless every instance is unhealthy)
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: consecutive failures reach FAILURE_THRESHOLD
//! Unhealthy → Healthy: any single success
//! ```
//!
//! # Design Decisions
//! - `healthy` is derived from the consecutive-failure counter on every read,
//!   so it can never disagree with it, even under concurrent recording
//! - Counters are lock-free atomics; probes and request outcomes race freely

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Consecutive failures after which an instance is unhealthy.
pub const FAILURE_THRESHOLD: u64 = 3;

/// Health counters for one backend instance.
#[derive(Debug)]
pub struct ServiceHealth {
    instance_id: String,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    consecutive_failures: AtomicU64,
    /// Milliseconds since the Unix epoch.
    last_check: AtomicI64,
}

/// Point-in-time view of a [`ServiceHealth`], as served to administrators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub instance_id: String,
    pub healthy: bool,
    pub success_rate: f64,
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u64,
    pub last_check: DateTime<Utc>,
}

impl ServiceHealth {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            last_check: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Record a successful outcome.
    ///
    /// Returns true if this success brought the instance back from unhealthy.
    pub fn record_success(&self) -> bool {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        let previous = self.consecutive_failures.swap(0, Ordering::AcqRel);
        self.touch();
        previous >= FAILURE_THRESHOLD
    }

    /// Record a failed outcome.
    ///
    /// Returns true if this failure is the one that made the instance unhealthy.
    pub fn record_failure(&self) -> bool {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        let consecutive = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        self.touch();
        consecutive == FAILURE_THRESHOLD
    }

    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures() < FAILURE_THRESHOLD
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Fraction of successful outcomes; 1.0 before any outcome is recorded.
    pub fn success_rate(&self) -> f64 {
        let successes = self.success_count();
        let total = successes + self.failure_count();
        if total == 0 {
            1.0
        } else {
            successes as f64 / total as f64
        }
    }

    pub fn last_check(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_check.load(Ordering::Relaxed))
            .unwrap_or_else(Utc::now)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let consecutive_failures = self.consecutive_failures();
        HealthSnapshot {
            instance_id: self.instance_id.clone(),
            healthy: consecutive_failures < FAILURE_THRESHOLD,
            success_rate: self.success_rate(),
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            consecutive_failures,
            last_check: self.last_check(),
        }
    }

    fn touch(&self) {
        self.last_check
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}
