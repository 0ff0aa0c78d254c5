//! Synthetic responses returned when no instance can serve a request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

pub const CIRCUIT_OPEN_MESSAGE: &str = "Service temporarily unavailable - circuit breaker open";
pub const ALL_DOWN_MESSAGE: &str = "Service temporarily unavailable - all instances down";

/// `{"error": message, "timestamp": ...}` with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "error": message,
        "timestamp": Utc::now().to_rfc3339(),
    });
    (status, Json(body)).into_response()
}

pub fn circuit_breaker() -> Response {
    error_response(StatusCode::SERVICE_UNAVAILABLE, CIRCUIT_OPEN_MESSAGE)
}

pub fn all_instances_down() -> Response {
    error_response(StatusCode::SERVICE_UNAVAILABLE, ALL_DOWN_MESSAGE)
}

pub fn cached() -> Response {
    let body = json!({
        "status": "cached",
        "message": "Cached response due to service unavailability",
        "timestamp": Utc::now().to_rfc3339(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

pub fn default_response(service_id: &str) -> Response {
    let body = json!({
        "status": "default",
        "message": "Default fallback response",
        "service": service_id,
        "timestamp": Utc::now().to_rfc3339(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_circuit_breaker_shape() {
        let response = circuit_breaker();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("circuit breaker"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_default_names_service() {
        let response = default_response("billing");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["service"], "billing");
        assert_eq!(body["status"], "default");
    }

    #[tokio::test]
    async fn test_cached_marks_response() {
        let body = body_json(cached()).await;
        assert_eq!(body["status"], "cached");
    }
}
