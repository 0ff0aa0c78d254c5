//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fallback RETRY_WITH_BACKOFF:
//!     → backoff.rs (delay before each wait-and-search cycle)
//!     → route manager searches for a healthy instance and redirects once
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every outbound call has a deadline
//!   (applied by the forwarder and the health prober)
//! - Jittered backoff prevents thundering herd
//! - Backoff is bounded both in attempts and in per-attempt delay

pub mod backoff;

pub use backoff::{calculate_backoff, BackoffPolicy};
