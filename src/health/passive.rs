//! Passive health checking (failure detection).
//!
//! # Responsibilities
//! - Classify upstream outcomes observed on the request path
//!
//! # Design Decisions
//! - Connection errors, timeouts and 5xx count as failures
//! - 4xx are NOT failures (client error, not backend)
//! - The classification feeds both the health state and the prediction model

use axum::http::StatusCode;

/// Whether an upstream status should count against the instance.
///
/// Applies to primary and redirect attempts alike: a 4xx from a redirect
/// target is relayed to the client and recorded as a success.
pub fn is_failure_status(status: StatusCode) -> bool {
    status.is_server_error()
}
