//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → ServiceDefinition identified
//!     → filter instances: active && healthy (fresh read every time)
//!     → weighted.rs (initial selection, proportional to weight)
//!     → round_robin.rs (rotation for redirection after a failure)
//!     → backend.rs (in-flight guard while the request is served)
//! ```
//!
//! # Design Decisions
//! - Definitions are built once; only `active` flags change at runtime
//! - Fail-open: when nothing is eligible the first configured instance is used
//! - Redirect rotation is a single atomic counter per service

pub mod backend;
pub mod pool;
pub mod round_robin;
pub mod weighted;

pub use backend::{InFlightGuard, InstanceDefinition, ServiceDefinition};
pub use pool::ServiceRegistry;
