//! Administrative API.
//!
//! # Endpoints
//! - `GET  /gateway/management/health`: health of every instance, grouped by service
//! - `POST /gateway/management/services/{id}/toggle?active=bool`: take a service's instances online/offline
//! - `GET  /gateway/management/services/{id}/prediction`: current failure prediction
//! - `GET  /gateway/management/status`: version and service count
//!
//! Served on its own listener. When `admin.api_key` is set every request
//! needs `Authorization: Bearer <key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::healing::SelfHealingRouteManager;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub manager: Arc<SelfHealingRouteManager>,
    pub api_key: Option<Arc<str>>,
    /// Horizon passed to prediction queries.
    pub horizon_minutes: u32,
}

impl AdminState {
    pub fn new(manager: Arc<SelfHealingRouteManager>, api_key: Option<String>, horizon_minutes: u32) -> Self {
        Self {
            manager,
            api_key: api_key.filter(|key| !key.is_empty()).map(Arc::from),
            horizon_minutes,
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/gateway/management/health", get(get_health))
        .route("/gateway/management/services/{id}/toggle", post(toggle_service))
        .route("/gateway/management/services/{id}/prediction", get(get_prediction))
        .route("/gateway/management/status", get(get_status))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
