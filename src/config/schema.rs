//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the self-healing gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Logical services and their backend instances.
    pub services: Vec<ServiceConfig>,

    /// Active health check settings.
    pub health_check: HealthCheckConfig,

    /// Failure prediction settings.
    pub prediction: PredictionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Backoff used by the RETRY_WITH_BACKOFF fallback.
    pub retries: RetryConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Administrative API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Policy applied when no healthy instance can serve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackStrategy {
    CircuitBreaker,
    RetryWithBackoff,
    FailoverInstance,
    CachedResponse,
    DefaultResponse,
    #[default]
    Hybrid,
}

impl FallbackStrategy {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStrategy::CircuitBreaker => "circuit_breaker",
            FallbackStrategy::RetryWithBackoff => "retry_with_backoff",
            FallbackStrategy::FailoverInstance => "failover_instance",
            FallbackStrategy::CachedResponse => "cached_response",
            FallbackStrategy::DefaultResponse => "default_response",
            FallbackStrategy::Hybrid => "hybrid",
        }
    }
}

/// A logical service exposed under a path prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service identifier.
    pub id: String,

    /// Human readable name.
    #[serde(default)]
    pub name: String,

    /// Path pattern, e.g. "/users/**" or "/users".
    pub path: String,

    /// Backend instances, in configured order.
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,

    /// Fallback policy. Unset behaves like HYBRID.
    #[serde(default)]
    pub fallback_strategy: Option<FallbackStrategy>,

    /// Route priority (higher = checked first).
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Whether the scheduler evaluates failure risk for this service.
    #[serde(default = "default_true")]
    pub enable_prediction: bool,

    /// Free-form labels.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A single backend instance of a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    /// Unique instance identifier (health is tracked per instance id).
    pub id: String,

    /// Base URL, e.g. "http://10.0.0.5:8080".
    pub url: String,

    /// Weight for weighted random selection.
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Initial value of the externally toggleable active flag.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Deployment environment tag.
    #[serde(default)]
    pub environment: Option<String>,
}

fn default_weight() -> u32 {
    100
}

fn default_priority() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Timeout of a single probe attempt in seconds.
    pub timeout_secs: u64,

    /// Attempts per probe before the outcome is folded as a failure.
    pub retry_count: u32,

    /// Path to probe for HTTP health checks.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_secs: 5,
            retry_count: 3,
            path: "/health".to_string(),
        }
    }
}

/// Failure prediction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Enable the periodic prediction loop.
    pub enabled: bool,

    /// Recency window used for training, in minutes.
    pub window_size_minutes: u64,

    /// Risk score above which action is required.
    pub failure_threshold: f64,

    /// Prediction loop interval in seconds.
    pub interval_secs: u64,

    /// Horizon passed to each prediction, in minutes.
    pub horizon_minutes: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_size_minutes: 10,
            failure_threshold: 0.7,
            interval_secs: 60,
            horizon_minutes: 5,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for each outbound proxied or redirected call, in seconds.
    pub upstream_secs: u64,

    /// Total time allowed for an inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 10,
            request_secs: 60,
        }
    }
}

/// Backoff configuration for the retry fallback.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total wait-and-search cycles.
    pub max_attempts: u32,

    /// Delay before the first cycle in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for a single delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

/// Request and response buffering limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,

    /// Maximum upstream response body size in bytes.
    pub max_response_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024,
            max_response_size: 10 * 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Administrative API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the administrative API.
    pub enabled: bool,

    /// Admin API bind address.
    pub bind_address: String,

    /// Optional bearer token required on every admin request.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            api_key: None,
        }
    }
}
