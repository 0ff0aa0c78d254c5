//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated)
//!     → service definitions built once at startup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Instance `active` flags are the only runtime-mutable part; they live in
//!   the load balancer's definitions, not here

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AdminConfig;
pub use schema::FallbackStrategy;
pub use schema::GatewayConfig;
pub use schema::HealthCheckConfig;
pub use schema::InstanceConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::PredictionConfig;
pub use schema::RetryConfig;
pub use schema::ServiceConfig;
pub use schema::TimeoutConfig;
