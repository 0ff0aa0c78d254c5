//! Service and instance definitions.
//!
//! # Responsibilities
//! - Represent a logical service and its backend instances
//! - Hold the externally toggleable `active` flag of each instance
//! - Track in-flight requests per service (reported as active connections)

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::{FallbackStrategy, InstanceConfig, ServiceConfig};
use crate::load_balancer::round_robin::RoundRobin;

/// A single backend instance.
#[derive(Debug)]
pub struct InstanceDefinition {
    pub id: String,
    /// Base URL the request path is appended to.
    pub url: String,
    /// Selection weight (0 is tolerated, see weighted selection).
    pub weight: u32,
    pub environment: Option<String>,
    /// Read fresh on every selection; toggled by administrators.
    active: AtomicBool,
}

impl InstanceDefinition {
    pub fn new(id: impl Into<String>, url: impl Into<String>, weight: u32) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            weight,
            environment: None,
            active: AtomicBool::new(true),
        }
    }

    pub fn from_config(config: &InstanceConfig) -> Self {
        Self {
            id: config.id.clone(),
            url: config.url.clone(),
            weight: config.weight,
            environment: config.environment.clone(),
            active: AtomicBool::new(config.active),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}

/// A logical service routed by path prefix.
#[derive(Debug)]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    /// Path pattern as configured.
    pub path: String,
    /// Instances in configured order.
    pub instances: Vec<Arc<InstanceDefinition>>,
    pub fallback_strategy: FallbackStrategy,
    pub priority: u32,
    pub prediction_enabled: bool,
    pub metadata: HashMap<String, String>,
    /// Rotation shared by every redirection for this service.
    pub redirect_counter: RoundRobin,
    in_flight: AtomicUsize,
}

impl ServiceDefinition {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        instances: Vec<InstanceDefinition>,
        fallback_strategy: FallbackStrategy,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            path: path.into(),
            instances: instances.into_iter().map(Arc::new).collect(),
            fallback_strategy,
            priority: 1,
            prediction_enabled: true,
            metadata: HashMap::new(),
            redirect_counter: RoundRobin::new(),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            path: config.path.clone(),
            instances: config
                .instances
                .iter()
                .map(|i| Arc::new(InstanceDefinition::from_config(i)))
                .collect(),
            fallback_strategy: config.fallback_strategy.unwrap_or_default(),
            priority: config.priority,
            prediction_enabled: config.enable_prediction,
            metadata: config.metadata.clone(),
            redirect_counter: RoundRobin::new(),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Set the `active` flag of every instance.
    pub fn set_active(&self, active: bool) {
        for instance in &self.instances {
            instance.set_active(active);
        }
    }

    pub fn instance(&self, instance_id: &str) -> Option<&Arc<InstanceDefinition>> {
        self.instances.iter().find(|i| i.id == instance_id)
    }

    /// Number of requests currently being served for this service.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Count a request as in flight until the guard is dropped.
    pub fn track(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            service: self.clone(),
        }
    }
}

/// A RAII guard that manages the in-flight request count.
#[derive(Debug)]
pub struct InFlightGuard {
    service: Arc<ServiceDefinition>,
}

impl Deref for InFlightGuard {
    type Target = ServiceDefinition;
    fn deref(&self) -> &Self::Target {
        &self.service
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.service.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
