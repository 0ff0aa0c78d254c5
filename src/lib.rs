//! Self-healing reverse proxy library.

pub mod admin;
pub mod config;
pub mod error;
pub mod healing;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod prediction;
pub mod resilience;
pub mod routing;
pub mod scheduler;

pub use config::GatewayConfig;
pub use healing::SelfHealingRouteManager;
pub use health::HealthMonitor;
pub use lifecycle::{Gateway, Shutdown};
pub use prediction::FailurePredictionEngine;
pub use scheduler::Scheduler;
