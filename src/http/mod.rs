//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (x-request-id generation and echo)
//!     → healing::SelfHealingRouteManager (route, select, forward, heal)
//!     → client.rs (pooled outbound client to instances)
//! ```

pub mod client;
pub mod request;
pub mod server;

pub use client::{build_client, HttpClient};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
