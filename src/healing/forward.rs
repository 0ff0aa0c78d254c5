//! Upstream forwarding.
//!
//! # Responsibilities
//! - Capture an inbound request once so it can be replayed to several instances
//! - Send it to `instance_url + path + query` under a timeout
//! - Buffer and classify the reply
//!
//! # Design Decisions
//! - `host`, `content-length` and `x-forwarded` are never copied, in either
//!   direction; the transport regenerates them
//! - Transport errors, timeouts and 5xx replies are failures

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tokio::time;

use crate::error::ForwardError;
use crate::health::passive::is_failure_status;
use crate::http::client::{join_url, HttpClient};

const SKIPPED_HEADERS: [&str; 3] = ["host", "content-length", "x-forwarded"];

/// Whether a header must not be copied between the client and an instance.
pub fn should_skip_header(name: &str) -> bool {
    SKIPPED_HEADERS
        .iter()
        .any(|skipped| skipped.eq_ignore_ascii_case(name))
}

/// Copy of `headers` without the skipped ones. Multi-valued headers keep every value.
pub fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !should_skip_header(name.as_str()) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

/// A fully buffered inbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Raw path plus `?query` when present.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamRequest {
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Buffer `request`, failing if its body exceeds `limit` bytes.
    pub async fn from_request(request: Request<Body>, limit: usize) -> Result<Self, axum::Error> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await?;
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Ok(Self {
            method: parts.method,
            path_and_query,
            headers: parts.headers,
            body,
        })
    }
}

/// A buffered, successful upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Already filtered.
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Sends buffered requests to instances.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    timeout: Duration,
    max_response_size: usize,
}

impl Forwarder {
    pub fn new(client: HttpClient, timeout: Duration, max_response_size: usize) -> Self {
        Self {
            client,
            timeout,
            max_response_size,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forward `request` to the instance at `base_url`.
    pub async fn send(
        &self,
        base_url: &str,
        request: &UpstreamRequest,
    ) -> Result<UpstreamResponse, ForwardError> {
        let url = join_url(base_url, &request.path_and_query);
        let uri: Uri = url
            .parse()
            .map_err(|_| ForwardError::InvalidUri(url.clone()))?;

        let body = if request.body.is_empty() {
            Body::empty()
        } else {
            Body::from(request.body.clone())
        };
        let mut outbound = Request::new(body);
        *outbound.method_mut() = request.method.clone();
        *outbound.uri_mut() = uri;
        *outbound.headers_mut() = filter_headers(&request.headers);

        let exchange = async {
            let response = self.client.request(outbound).await?;
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), self.max_response_size).await?;
            Ok::<_, ForwardError>((parts, body))
        };

        let (parts, body) = time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))??;

        if is_failure_status(parts.status) {
            return Err(ForwardError::UpstreamStatus(parts.status));
        }

        Ok(UpstreamResponse {
            status: parts.status,
            headers: filter_headers(&parts.headers),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_skip_is_case_insensitive() {
        for name in ["host", "Host", "HOST", "Content-Length", "X-Forwarded", "x-forwarded"] {
            assert!(should_skip_header(name), "{name} should be skipped");
        }
        for name in ["x-forwarded-for", "content-type", "authorization", "x-request-id"] {
            assert!(!should_skip_header(name), "{name} should be kept");
        }
    }

    #[test]
    fn test_filter_headers_keeps_multi_values() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("proxy.local"));
        headers.insert("content-length", HeaderValue::from_static("12"));
        headers.insert("x-forwarded", HeaderValue::from_static("yes"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let filtered = filter_headers(&headers);
        assert!(filtered.get("host").is_none());
        assert!(filtered.get("content-length").is_none());
        assert!(filtered.get("x-forwarded").is_none());
        assert_eq!(filtered.get_all("accept").iter().count(), 2);
    }

    #[tokio::test]
    async fn test_from_request_captures_query_and_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("http://proxy.local/users/7?verbose=true")
            .body(Body::from("payload"))
            .unwrap();
        let captured = UpstreamRequest::from_request(request, 1024).await.unwrap();
        assert_eq!(captured.method, Method::POST);
        assert_eq!(captured.path_and_query, "/users/7?verbose=true");
        assert_eq!(&captured.body[..], b"payload");
    }

    #[tokio::test]
    async fn test_from_request_enforces_limit() {
        let request = Request::builder()
            .uri("/big")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();
        assert!(UpstreamRequest::from_request(request, 16).await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_instance_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let forwarder = Forwarder::new(crate::http::client::build_client(), Duration::from_secs(2), 1024);
        let request = UpstreamRequest::new(Method::GET, "/");
        let err = forwarder
            .send(&format!("http://{addr}"), &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Transport(_)));
    }
}
