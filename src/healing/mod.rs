//! Self-healing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → manager.rs (route match, weighted healthy selection)
//!     → forward.rs (buffered send to the chosen instance)
//!     → on failure: round-robin redirection over healthy instances,
//!       at most min(instances, 3) attempts
//!     → exhausted: fallback.rs response picked by the service's strategy
//!
//! Every attempt → health (passive) + prediction window + metrics
//! ```
//!
//! # Design Decisions
//! - Errors never reach the caller; the last resort is a fallback response
//! - Selection fails open to the first configured instance
//! - Resource figures come from a pluggable [`telemetry::LoadSampler`]

pub mod fallback;
pub mod forward;
pub mod manager;
pub mod telemetry;

pub use forward::{filter_headers, should_skip_header, Forwarder, UpstreamRequest, UpstreamResponse};
pub use manager::{SelfHealingRouteManager, MAX_REDIRECT_ATTEMPTS};
pub use telemetry::{FixedLoad, LoadSample, LoadSampler, SyntheticLoad};
