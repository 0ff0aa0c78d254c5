//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Scheduler tick
//!     → Probe each instance's health endpoint
//!     → Update state.rs via monitor.rs
//!
//! Passive health checks (passive.rs):
//!     Request outcome observed by the route manager
//!     → Classify success / failure
//!     → Update state.rs via monitor.rs
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//!     3 consecutive failures to fall, 1 success to recover
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - Health state is per-instance, created lazily on first outcome
//! - Instances without any recorded outcome are not considered healthy

pub mod active;
pub mod monitor;
pub mod passive;
pub mod state;

pub use active::ProbeResult;
pub use monitor::HealthMonitor;
pub use state::{HealthSnapshot, ServiceHealth, FAILURE_THRESHOLD};
