//! Request correlation.
//!
//! # Responsibilities
//! - Give every inbound request an `x-request-id` (UUID v4) unless the client sent one
//! - Echo the id on the response
//!
//! # Design Decisions
//! - The id stays in the request headers, so it is also forwarded to instances

use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request id header, if present and valid UTF-8.
pub fn request_id<B>(request: &Request<B>) -> Option<&str> {
    request.headers().get(X_REQUEST_ID)?.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_uuids() {
        let request = Request::new(());
        let mut maker = UuidRequestId;
        let id = maker.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());

        let other = maker.make_request_id(&request).unwrap();
        assert_ne!(id.header_value(), other.header_value());
    }

    #[test]
    fn test_request_id_reads_header() {
        let request = Request::builder()
            .header("x-request-id", "abc-123")
            .body(())
            .unwrap();
        assert_eq!(request_id(&request), Some("abc-123"));
    }
}
