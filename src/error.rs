//! Error types shared across subsystems.

use std::time::Duration;

use axum::http::StatusCode;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("service #{index} has an empty id")]
    EmptyServiceId { index: usize },

    #[error("duplicate service id '{0}'")]
    DuplicateServiceId(String),

    #[error("service '{0}' has an empty path")]
    EmptyPath(String),

    #[error("service '{service}' has an instance with an empty id")]
    EmptyInstanceId { service: String },

    #[error("service '{service}' has duplicate instance id '{instance}'")]
    DuplicateInstanceId { service: String, instance: String },

    #[error("instance '{instance}' has invalid url '{url}'")]
    InvalidInstanceUrl { instance: String, url: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("prediction.failure_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(String),
}

/// Failure of a single outbound call to a backend instance.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream uri '{0}'")]
    InvalidUri(String),

    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read upstream body: {0}")]
    Body(#[from] axum::Error),

    #[error("upstream responded with {0}")]
    UpstreamStatus(StatusCode),
}
