//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every subsystem from a validated [`GatewayConfig`], in dependency order
//! - Start the scheduler loops
//! - Bind the proxy and admin listeners and serve until shutdown
//!
//! # Design Decisions
//! - Listeners start last, after the scheduler has been spawned
//! - The first health batch runs immediately, so instances leave the
//!   "never checked" state as soon as possible

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::GatewayConfig;
use crate::healing::{Forwarder, SelfHealingRouteManager};
use crate::health::HealthMonitor;
use crate::http::{build_client, HttpServer};
use crate::lifecycle::Shutdown;
use crate::load_balancer::ServiceRegistry;
use crate::prediction::FailurePredictionEngine;
use crate::resilience::BackoffPolicy;
use crate::scheduler::Scheduler;

/// A fully wired proxy, ready to serve.
pub struct Gateway {
    config: GatewayConfig,
    manager: Arc<SelfHealingRouteManager>,
    scheduler: Arc<Scheduler>,
    shutdown: Arc<Shutdown>,
}

impl Gateway {
    pub fn build(config: GatewayConfig) -> Self {
        let client = build_client();
        let registry = Arc::new(ServiceRegistry::from_config(&config.services));
        let health = Arc::new(HealthMonitor::new(client.clone(), &config.health_check));
        let predictions = Arc::new(FailurePredictionEngine::new(&config.prediction));
        let forwarder = Forwarder::new(
            client,
            Duration::from_secs(config.timeouts.upstream_secs),
            config.limits.max_response_size,
        );

        let manager = Arc::new(
            SelfHealingRouteManager::new(registry.clone(), health.clone(), predictions.clone(), forwarder)
                .with_backoff(BackoffPolicy::from(&config.retries))
                .with_max_body_size(config.limits.max_body_size),
        );
        let scheduler = Arc::new(Scheduler::new(
            registry.clone(),
            health,
            predictions,
            config.health_check.clone(),
            config.prediction.clone(),
        ));

        tracing::info!(
            services = registry.services().len(),
            instances = registry.all_instances().len(),
            "Gateway initialized"
        );

        Self {
            config,
            manager,
            scheduler,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub fn manager(&self) -> &Arc<SelfHealingRouteManager> {
        &self.manager
    }

    /// Handle that stops the gateway when triggered.
    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Bind the configured addresses and serve until shutdown.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let proxy = TcpListener::bind(&self.config.listener.bind_address).await?;
        let admin = if self.config.admin.enabled {
            Some(TcpListener::bind(&self.config.admin.bind_address).await?)
        } else {
            None
        };
        self.serve(proxy, admin).await
    }

    /// Serve on already bound listeners until shutdown.
    pub async fn serve(
        self,
        proxy: TcpListener,
        admin: Option<TcpListener>,
    ) -> Result<(), std::io::Error> {
        let loops = self.scheduler.clone().start(&self.shutdown);

        let admin_task = admin.map(|listener| {
            let state = AdminState::new(
                self.manager.clone(),
                self.config.admin.api_key.clone(),
                self.config.prediction.horizon_minutes,
            );
            let router = setup_admin_router(state);
            let mut shutdown = self.shutdown.subscribe();
            tokio::spawn(async move {
                if let Ok(addr) = listener.local_addr() {
                    tracing::info!(address = %addr, "Admin API listening");
                }
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                    })
                    .await
            })
        });

        let server = HttpServer::new(self.manager.clone(), &self.config.timeouts);
        let result = server.run(proxy, self.shutdown.subscribe()).await;

        // The proxy can also stop on its own error; make sure the rest follows.
        self.shutdown.trigger();
        for handle in loops {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Scheduler task failed");
            }
        }
        if let Some(task) = admin_task {
            match task.await {
                Ok(Err(e)) => tracing::error!(error = %e, "Admin API error"),
                Err(e) => tracing::error!(error = %e, "Admin API task failed"),
                Ok(Ok(())) => {}
            }
        }

        tracing::info!("Gateway stopped");
        result
    }
}
