//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate path prefix)
//!     → Return: matched ServiceDefinition or NoMatch
//!
//! Route Compilation (at startup):
//!     ServiceDefinition[]
//!     → Sort by priority, then specificity
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins

pub mod matcher;
pub mod router;

pub use router::{Route, RouteTable};
