//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check identifier uniqueness for services and instances
//! - Validate value ranges (intervals > 0, thresholds in range)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Degenerate routing setups (no instances, zero weights) are not rejected;
//!   [`degenerate_services`] lists them so the caller can warn once logging is up

use std::collections::HashSet;

use url::Url;

use crate::config::schema::GatewayConfig;
use crate::error::ValidationError;

/// Services that validate but route poorly, with the reason.
pub fn degenerate_services(config: &GatewayConfig) -> Vec<(&str, &'static str)> {
    config
        .services
        .iter()
        .filter_map(|service| {
            if service.instances.is_empty() {
                Some((
                    service.id.as_str(),
                    "Service has no instances; every request will use its fallback strategy",
                ))
            } else if service.instances.iter().all(|i| i.weight == 0) {
                Some((
                    service.id.as_str(),
                    "All instance weights are zero; selection will use the first eligible instance",
                ))
            } else {
                None
            }
        })
        .collect()
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut service_ids = HashSet::new();

    for (index, service) in config.services.iter().enumerate() {
        if service.id.trim().is_empty() {
            errors.push(ValidationError::EmptyServiceId { index });
        } else if !service_ids.insert(service.id.as_str()) {
            errors.push(ValidationError::DuplicateServiceId(service.id.clone()));
        }

        if service.path.trim().is_empty() {
            errors.push(ValidationError::EmptyPath(service.id.clone()));
        }

        let mut instance_ids = HashSet::new();
        for instance in &service.instances {
            if instance.id.trim().is_empty() {
                errors.push(ValidationError::EmptyInstanceId {
                    service: service.id.clone(),
                });
            } else if !instance_ids.insert(instance.id.as_str()) {
                errors.push(ValidationError::DuplicateInstanceId {
                    service: service.id.clone(),
                    instance: instance.id.clone(),
                });
            }

            if Url::parse(&instance.url).is_err() {
                errors.push(ValidationError::InvalidInstanceUrl {
                    instance: instance.id.clone(),
                    url: instance.url.clone(),
                });
            }
        }
    }

    let positive = [
        ("health_check.interval_secs", config.health_check.interval_secs),
        ("health_check.timeout_secs", config.health_check.timeout_secs),
        ("health_check.retry_count", u64::from(config.health_check.retry_count)),
        ("prediction.interval_secs", config.prediction.interval_secs),
        ("prediction.window_size_minutes", config.prediction.window_size_minutes),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("retries.max_attempts", u64::from(config.retries.max_attempts)),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(name));
        }
    }

    let threshold = config.prediction.failure_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ValidationError::ThresholdOutOfRange(threshold.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
