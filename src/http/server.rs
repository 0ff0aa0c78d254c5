//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router that sends every path to the route manager
//! - Wire up middleware (request id, tracing, whole-request timeout)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::TimeoutConfig;
use crate::healing::SelfHealingRouteManager;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SelfHealingRouteManager>,
}

/// HTTP server for the proxied routes.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(manager: Arc<SelfHealingRouteManager>, timeouts: &TimeoutConfig) -> Self {
        let state = AppState { manager };
        Self {
            router: Self::build_router(state, Duration::from_secs(timeouts.request_secs)),
        }
    }

    #[allow(deprecated)]
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// The fully layered router, for embedding or tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    tracing::debug!(
        request_id = request_id(&request).unwrap_or("unknown"),
        method = %request.method(),
        path = %request.uri().path(),
        "Proxying request"
    );
    state.manager.handle(request).await
}
