//! Service registry.
//!
//! # Responsibilities
//! - Build service definitions from configuration once at startup
//! - Look services up by id for the admin API and the scheduler
//! - Enumerate every instance for health probing

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::load_balancer::backend::{InstanceDefinition, ServiceDefinition};

/// Immutable set of services shared by the route manager, scheduler and admin API.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<ServiceDefinition>>,
}

impl ServiceRegistry {
    pub fn new(services: Vec<ServiceDefinition>) -> Self {
        Self {
            services: services.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn from_config(configs: &[ServiceConfig]) -> Self {
        let services = configs.iter().map(ServiceDefinition::from_config).collect();
        Self::new(services)
    }

    pub fn services(&self) -> &[Arc<ServiceDefinition>] {
        &self.services
    }

    pub fn get(&self, service_id: &str) -> Option<&Arc<ServiceDefinition>> {
        self.services.iter().find(|s| s.id == service_id)
    }

    /// Every `(service, instance)` pair, in configured order.
    pub fn all_instances(&self) -> Vec<(Arc<ServiceDefinition>, Arc<InstanceDefinition>)> {
        self.services
            .iter()
            .flat_map(|service| {
                service
                    .instances
                    .iter()
                    .map(move |instance| (service.clone(), instance.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstanceConfig;

    #[test]
    fn test_registry_from_config() {
        let configs = vec![ServiceConfig {
            id: "users".into(),
            name: "Users".into(),
            path: "/users/**".into(),
            instances: vec![
                InstanceConfig {
                    id: "u1".into(),
                    url: "http://127.0.0.1:9001".into(),
                    weight: 10,
                    active: true,
                    environment: Some("prod".into()),
                },
                InstanceConfig {
                    id: "u2".into(),
                    url: "http://127.0.0.1:9002".into(),
                    weight: 20,
                    active: false,
                    environment: None,
                },
            ],
            fallback_strategy: None,
            priority: 2,
            enable_prediction: false,
            metadata: Default::default(),
        }];

        let registry = ServiceRegistry::from_config(&configs);
        let users = registry.get("users").unwrap();
        assert_eq!(users.fallback_strategy, crate::config::FallbackStrategy::Hybrid);
        assert!(!users.prediction_enabled);
        assert!(users.instance("u1").unwrap().is_active());
        assert!(!users.instance("u2").unwrap().is_active());
        assert_eq!(registry.all_instances().len(), 2);
        assert!(registry.get("orders").is_none());
    }
}
