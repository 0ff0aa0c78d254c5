//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → registry, health, prediction → route manager
//!     → scheduler loops → admin + proxy listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → loops exit, servers drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::Gateway;
