use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::healing::fallback;
use crate::health::HealthSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub services: usize,
    pub instances: usize,
}

#[derive(Serialize)]
pub struct HealthReport {
    /// service id → instance id → health. Instances never checked are omitted.
    pub services: BTreeMap<String, BTreeMap<String, HealthSnapshot>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ToggleParams {
    pub active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResult {
    pub status: &'static str,
    pub service_id: String,
    pub active: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let registry = state.manager.registry();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        services: registry.services().len(),
        instances: registry.all_instances().len(),
    })
}

pub async fn get_health(State(state): State<AdminState>) -> Json<HealthReport> {
    let health = state.manager.health();
    let mut services = BTreeMap::new();

    for service in state.manager.registry().services() {
        let instances: BTreeMap<_, _> = service
            .instances
            .iter()
            .filter_map(|instance| {
                health
                    .get_health(&instance.id)
                    .map(|h| (instance.id.clone(), h.snapshot()))
            })
            .collect();
        services.insert(service.id.clone(), instances);
    }

    Json(HealthReport {
        services,
        timestamp: Utc::now(),
    })
}

pub async fn toggle_service(
    State(state): State<AdminState>,
    Path(service_id): Path<String>,
    Query(params): Query<ToggleParams>,
) -> Response {
    let Some(service) = state.manager.registry().get(&service_id) else {
        return fallback::error_response(StatusCode::NOT_FOUND, "Service not found");
    };

    service.set_active(params.active);
    tracing::info!(service = %service_id, active = params.active, "Service toggled");

    Json(ToggleResult {
        status: "updated",
        service_id,
        active: params.active,
    })
    .into_response()
}

pub async fn get_prediction(
    State(state): State<AdminState>,
    Path(service_id): Path<String>,
) -> Response {
    if state.manager.registry().get(&service_id).is_none() {
        return fallback::error_response(StatusCode::NOT_FOUND, "Service not found");
    }

    let prediction = state
        .manager
        .predictions()
        .predict_failure(&service_id, state.horizon_minutes);
    Json(prediction).into_response()
}
