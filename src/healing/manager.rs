//! Self-healing request routing.
//!
//! Every proxied request goes through [`SelfHealingRouteManager::handle`]:
//! route match, instance selection, the self-healing filter, bounded
//! redirection and finally the service's fallback strategy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::FallbackStrategy;
use crate::error::ForwardError;
use crate::healing::fallback;
use crate::healing::forward::{Forwarder, UpstreamRequest, UpstreamResponse};
use crate::healing::telemetry::{LoadSampler, SyntheticLoad};
use crate::health::HealthMonitor;
use crate::load_balancer::weighted::select_by_weight;
use crate::load_balancer::{InstanceDefinition, ServiceDefinition, ServiceRegistry};
use crate::observability::metrics;
use crate::prediction::FailurePredictionEngine;
use crate::resilience::BackoffPolicy;
use crate::routing::RouteTable;

/// Upper bound on redirection attempts per request, whatever the instance count.
pub const MAX_REDIRECT_ATTEMPTS: usize = 3;

const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

pub struct SelfHealingRouteManager {
    routes: RouteTable,
    registry: Arc<ServiceRegistry>,
    health: Arc<HealthMonitor>,
    predictions: Arc<FailurePredictionEngine>,
    forwarder: Forwarder,
    sampler: Arc<dyn LoadSampler>,
    backoff: BackoffPolicy,
    max_body_size: usize,
}

impl SelfHealingRouteManager {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        health: Arc<HealthMonitor>,
        predictions: Arc<FailurePredictionEngine>,
        forwarder: Forwarder,
    ) -> Self {
        Self {
            routes: RouteTable::new(registry.services()),
            registry,
            health,
            predictions,
            forwarder,
            sampler: Arc::new(SyntheticLoad),
            backoff: BackoffPolicy::default(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn LoadSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn predictions(&self) -> &Arc<FailurePredictionEngine> {
        &self.predictions
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Service owning `path`, if any.
    pub fn route(&self, path: &str) -> Option<&Arc<ServiceDefinition>> {
        self.routes.match_path(path)
    }

    /// Proxy one inbound request. Always produces a well-formed response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let Some(service) = self.route(request.uri().path()).cloned() else {
            tracing::debug!(path = %request.uri().path(), "No route matched");
            return fallback::error_response(StatusCode::NOT_FOUND, "No route matches the request path");
        };

        if declared_length(&request).is_some_and(|len| len > self.max_body_size) {
            return payload_too_large();
        }
        let request = match UpstreamRequest::from_request(request, self.max_body_size).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(service = %service.id, error = %e, "Failed to read request body");
                return fallback::error_response(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        let _in_flight = service.track();
        match self.select_healthy_instance(&service) {
            Some(instance) => self.self_healing_filter(&service, &instance, &request).await,
            None => {
                tracing::warn!(service = %service.id, "Service has no instances configured");
                self.handle_fallback_strategy(&service, &request).await
            }
        }
    }

    /// Instances that are active and currently healthy, in configured order.
    ///
    /// `active` is read fresh on every call so administrative toggles apply
    /// to the very next request.
    pub fn healthy_instances(&self, service: &ServiceDefinition) -> Vec<Arc<InstanceDefinition>> {
        service
            .instances
            .iter()
            .filter(|instance| instance.is_active() && self.health.is_healthy(&instance.id))
            .cloned()
            .collect()
    }

    /// Weighted random choice among healthy instances.
    ///
    /// Fails open: when nothing is healthy the first configured instance is
    /// returned regardless of its health, so a destination always exists.
    /// `None` only for a service without instances.
    pub fn select_healthy_instance(&self, service: &ServiceDefinition) -> Option<Arc<InstanceDefinition>> {
        let healthy = self.healthy_instances(service);
        if healthy.is_empty() {
            tracing::warn!(
                service = %service.id,
                "No healthy instances available, using first configured instance"
            );
            return service.instances.first().cloned();
        }
        select_by_weight(&healthy, &mut rand::thread_rng()).cloned()
    }

    /// Send `request` to `instance` and heal the failure if it does not succeed.
    pub async fn self_healing_filter(
        &self,
        service: &Arc<ServiceDefinition>,
        instance: &Arc<InstanceDefinition>,
        request: &UpstreamRequest,
    ) -> Response {
        let started = Instant::now();
        match self.forwarder.send(&instance.url, request).await {
            Ok(response) => {
                self.record_outcome(service, instance, true, started.elapsed());
                response.into_response()
            }
            Err(e) => {
                self.record_outcome(service, instance, false, started.elapsed());
                tracing::warn!(
                    service = %service.id,
                    instance = %instance.id,
                    error = %e,
                    "Request failed"
                );
                self.handle_failure_with_redirection(service, request, 0).await
            }
        }
    }

    /// Redirect to other healthy instances, at most `min(instances, 3)` times
    /// counting from `attempt`, then dispatch the fallback strategy.
    pub async fn handle_failure_with_redirection(
        &self,
        service: &Arc<ServiceDefinition>,
        request: &UpstreamRequest,
        mut attempt: usize,
    ) -> Response {
        let bound = service.instances.len().min(MAX_REDIRECT_ATTEMPTS);

        loop {
            if attempt >= bound {
                tracing::error!(service = %service.id, attempts = attempt, "Max redirect attempts reached");
                return self.handle_fallback_strategy(service, request).await;
            }

            let Some(candidate) = self.find_next_healthy_instance(service, attempt) else {
                tracing::warn!(
                    service = %service.id,
                    strategy = service.fallback_strategy.as_str(),
                    "No healthy instances available, falling back"
                );
                return self.handle_fallback_strategy(service, request).await;
            };

            tracing::info!(
                service = %service.id,
                instance = %candidate.id,
                attempt = attempt + 1,
                "Redirecting request to healthy instance"
            );
            match self.redirect_to_instance(service, &candidate, request).await {
                Ok(response) => return response.into_response(),
                Err(_) => attempt += 1,
            }
        }
    }

    /// Round-robin pick among healthy instances, shifted by `attempt`.
    pub fn find_next_healthy_instance(
        &self,
        service: &ServiceDefinition,
        attempt: usize,
    ) -> Option<Arc<InstanceDefinition>> {
        let healthy = self.healthy_instances(service);
        let index = service.redirect_counter.next_index(attempt, healthy.len())?;
        healthy.get(index).cloned()
    }

    /// First active and healthy instance, without rotation.
    pub fn find_any_healthy_instance(&self, service: &ServiceDefinition) -> Option<Arc<InstanceDefinition>> {
        service
            .instances
            .iter()
            .find(|instance| instance.is_active() && self.health.is_healthy(&instance.id))
            .cloned()
    }

    /// One forwarding attempt to `instance`, with its outcome recorded.
    pub async fn redirect_to_instance(
        &self,
        service: &Arc<ServiceDefinition>,
        instance: &Arc<InstanceDefinition>,
        request: &UpstreamRequest,
    ) -> Result<UpstreamResponse, ForwardError> {
        metrics::record_redirect(&service.id);
        let started = Instant::now();
        let result = self.forwarder.send(&instance.url, request).await;
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(service = %service.id, instance = %instance.id, "Redirect succeeded");
                self.record_outcome(service, instance, true, elapsed);
            }
            Err(e) => {
                tracing::warn!(
                    service = %service.id,
                    instance = %instance.id,
                    error = %e,
                    "Redirect failed"
                );
                self.record_outcome(service, instance, false, elapsed);
            }
        }
        result
    }

    /// Response of last resort, chosen by the service's fallback strategy.
    pub async fn handle_fallback_strategy(
        &self,
        service: &Arc<ServiceDefinition>,
        request: &UpstreamRequest,
    ) -> Response {
        let strategy = service.fallback_strategy;
        metrics::record_fallback(&service.id, strategy.as_str());

        match strategy {
            FallbackStrategy::CircuitBreaker => {
                tracing::info!(service = %service.id, "Circuit breaker activated");
                fallback::circuit_breaker()
            }
            FallbackStrategy::CachedResponse => {
                tracing::info!(service = %service.id, "Returning cached response");
                fallback::cached()
            }
            FallbackStrategy::DefaultResponse => {
                tracing::info!(service = %service.id, "Returning default response");
                fallback::default_response(&service.id)
            }
            FallbackStrategy::RetryWithBackoff => self.retry_with_backoff(service, request).await,
            FallbackStrategy::FailoverInstance | FallbackStrategy::Hybrid => {
                self.failover(service, request).await
            }
        }
    }

    /// Wait, look for any healthy instance and try it once; repeat with
    /// growing delays until the attempts run out.
    async fn retry_with_backoff(&self, service: &Arc<ServiceDefinition>, request: &UpstreamRequest) -> Response {
        for attempt in 1..=self.backoff.max_attempts {
            tokio::time::sleep(self.backoff.delay(attempt)).await;

            match self.find_any_healthy_instance(service) {
                Some(instance) => {
                    if let Ok(response) = self.redirect_to_instance(service, &instance, request).await {
                        return response.into_response();
                    }
                }
                None => {
                    tracing::debug!(service = %service.id, attempt, "No healthy instance found");
                }
            }
            tracing::info!(service = %service.id, attempt, "Retrying request");
        }

        tracing::error!(service = %service.id, "Retries exhausted, all instances down");
        fallback::all_instances_down()
    }

    async fn failover(&self, service: &Arc<ServiceDefinition>, request: &UpstreamRequest) -> Response {
        let Some(instance) = self.find_any_healthy_instance(service) else {
            tracing::info!(service = %service.id, "No healthy instances, returning default response");
            return fallback::default_response(&service.id);
        };

        tracing::info!(service = %service.id, instance = %instance.id, "Failing over to healthy instance");
        match self.redirect_to_instance(service, &instance, request).await {
            Ok(response) => response.into_response(),
            Err(_) => fallback::default_response(&service.id),
        }
    }

    /// Feed one attempt into passive health, the prediction window and metrics.
    fn record_outcome(
        &self,
        service: &ServiceDefinition,
        instance: &InstanceDefinition,
        success: bool,
        elapsed: Duration,
    ) {
        if success {
            self.health.record_success(&instance.id);
        } else {
            self.health.record_failure(&instance.id);
        }
        metrics::record_request(&service.id, success, elapsed);

        let load = self.sampler.sample();
        let active_connections = u32::try_from(service.in_flight()).unwrap_or(u32::MAX);
        self.predictions.record_metric(
            &service.id,
            elapsed.as_secs_f64() * 1000.0,
            success,
            load.cpu_usage,
            load.memory_usage,
            active_connections,
        );
    }
}

fn declared_length(request: &Request<Body>) -> Option<usize> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn payload_too_large() -> Response {
    fallback::error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthCheckConfig;
    use crate::http::client::build_client;

    fn manager(services: Vec<ServiceDefinition>) -> SelfHealingRouteManager {
        let client = build_client();
        SelfHealingRouteManager::new(
            Arc::new(ServiceRegistry::new(services)),
            Arc::new(HealthMonitor::new(client.clone(), &HealthCheckConfig::default())),
            Arc::new(FailurePredictionEngine::default()),
            Forwarder::new(client, Duration::from_secs(1), 1024),
        )
    }

    fn service(strategy: FallbackStrategy) -> ServiceDefinition {
        ServiceDefinition::new(
            "orders",
            "/orders/**",
            vec![
                InstanceDefinition::new("orders-1", "http://127.0.0.1:1", 1),
                InstanceDefinition::new("orders-2", "http://127.0.0.1:2", 1),
            ],
            strategy,
        )
    }

    #[test]
    fn test_selection_fails_open_to_first_instance() {
        let manager = manager(vec![service(FallbackStrategy::Hybrid)]);
        let service = manager.registry().get("orders").unwrap().clone();
        for _ in 0..20 {
            let selected = manager.select_healthy_instance(&service).unwrap();
            assert_eq!(selected.id, "orders-1");
        }
    }

    #[test]
    fn test_selection_spreads_over_equal_weights() {
        let manager = manager(vec![service(FallbackStrategy::Hybrid)]);
        manager.health().record_success("orders-1");
        manager.health().record_success("orders-2");
        let service = manager.registry().get("orders").unwrap().clone();

        let trials = 4000;
        let first = (0..trials)
            .filter(|_| manager.select_healthy_instance(&service).unwrap().id == "orders-1")
            .count();
        let share = first as f64 / trials as f64;
        assert!((0.4..0.6).contains(&share), "share was {share}");
    }

    #[test]
    fn test_inactive_instances_are_skipped() {
        let manager = manager(vec![service(FallbackStrategy::Hybrid)]);
        manager.health().record_success("orders-1");
        manager.health().record_success("orders-2");
        let service = manager.registry().get("orders").unwrap().clone();
        service.instance("orders-1").unwrap().set_active(false);

        for _ in 0..20 {
            assert_eq!(manager.select_healthy_instance(&service).unwrap().id, "orders-2");
        }
        assert_eq!(manager.find_any_healthy_instance(&service).unwrap().id, "orders-2");
    }

    #[test]
    fn test_next_healthy_instance_rotates() {
        let manager = manager(vec![service(FallbackStrategy::Hybrid)]);
        manager.health().record_success("orders-1");
        manager.health().record_success("orders-2");
        let service = manager.registry().get("orders").unwrap().clone();

        let a = manager.find_next_healthy_instance(&service, 0).unwrap();
        let b = manager.find_next_healthy_instance(&service, 0).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_next_healthy_instance_none_when_all_down() {
        let manager = manager(vec![service(FallbackStrategy::Hybrid)]);
        let service = manager.registry().get("orders").unwrap().clone();
        assert!(manager.find_next_healthy_instance(&service, 0).is_none());
        assert!(manager.find_any_healthy_instance(&service).is_none());
    }

    #[tokio::test]
    async fn test_unrouted_path_is_not_found() {
        let manager = manager(vec![service(FallbackStrategy::Hybrid)]);
        let request = Request::builder().uri("/nothing-here").body(Body::empty()).unwrap();
        let response = manager.handle(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_declared_oversized_body_is_rejected() {
        let manager = manager(vec![service(FallbackStrategy::Hybrid)]).with_max_body_size(8);
        let request = Request::builder()
            .method("POST")
            .uri("/orders/1")
            .header(header::CONTENT_LENGTH, "64")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();
        let response = manager.handle(request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_service_without_instances_uses_fallback() {
        let empty = ServiceDefinition::new("empty", "/empty", vec![], FallbackStrategy::CircuitBreaker);
        let manager = manager(vec![empty]);
        let request = Request::builder().uri("/empty/x").body(Body::empty()).unwrap();
        let response = manager.handle(request).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_immediate_fallbacks() {
        let request = UpstreamRequest::new(axum::http::Method::GET, "/orders");

        let cached = manager(vec![service(FallbackStrategy::CachedResponse)]);
        let svc = cached.registry().get("orders").unwrap().clone();
        assert_eq!(cached.handle_fallback_strategy(&svc, &request).await.status(), StatusCode::OK);

        let hybrid = manager(vec![service(FallbackStrategy::Hybrid)]);
        let svc = hybrid.registry().get("orders").unwrap().clone();
        let response = hybrid.handle_fallback_strategy(&svc, &request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("orders"));
    }
}
