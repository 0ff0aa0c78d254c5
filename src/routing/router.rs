//! Route lookup.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - Ordered by priority (higher first), then by prefix length (longer first)
//! - Explicit no-match rather than silent default

use std::sync::Arc;

use crate::load_balancer::ServiceDefinition;
use crate::routing::matcher::PathPrefixMatcher;

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub matcher: PathPrefixMatcher,
    pub service: Arc<ServiceDefinition>,
}

/// Path → service routing table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(services: &[Arc<ServiceDefinition>]) -> Self {
        let mut routes: Vec<Route> = services
            .iter()
            .map(|service| Route {
                matcher: PathPrefixMatcher::new(service.path.as_str()),
                service: service.clone(),
            })
            .collect();

        routes.sort_by(|a, b| {
            b.service
                .priority
                .cmp(&a.service.priority)
                .then_with(|| b.matcher.prefix().len().cmp(&a.matcher.prefix().len()))
        });

        for route in &routes {
            tracing::debug!(
                route = %format!("route-{}", route.service.id),
                prefix = %route.matcher.prefix(),
                priority = route.service.priority,
                "Route compiled"
            );
        }

        Self { routes }
    }

    pub fn match_path(&self, path: &str) -> Option<&Arc<ServiceDefinition>> {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(path))
            .map(|route| &route.service)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
