use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::admin::AdminState;
use crate::healing::fallback;

/// Reject requests without the configured bearer key. Open when no key is set.
pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if presented == Some(expected) {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request without valid credentials");
    fallback::error_response(StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}
