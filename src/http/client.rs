//! Outbound HTTP client shared by health probes and upstream forwarding.

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Pooled HTTP/1.1 + HTTP/2 client used for every outbound call.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the shared outbound client.
pub fn build_client() -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_nodelay(true);
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Concatenate an instance base URL with a path, avoiding a doubled slash.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    } else {
        format!("{}{}", base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a:1", "/health"), "http://a:1/health");
        assert_eq!(join_url("http://a:1/", "/health"), "http://a:1/health");
        assert_eq!(join_url("http://a:1/v1", "?q=1"), "http://a:1/v1?q=1");
    }
}
