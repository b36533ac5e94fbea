//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (weights > 0, window > 0, interval > 0)
//! - Keep the success rate term dominant over the delay term
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RankerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use crate::config::schema::RankerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for values the ranker cannot work with.
pub fn validate_config(config: &RankerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let cdn = &config.cdn;
    let scoring = &config.scoring;

    if cdn.host_list_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("cdn.host_list_path", "must not be empty"));
    }
    if cdn.snapshot_path.as_os_str().is_empty() {
        errors.push(ValidationError::new("cdn.snapshot_path", "must not be empty"));
    }
    if cdn.snapshot_interval_secs == 0 {
        errors.push(ValidationError::new("cdn.snapshot_interval_secs", "must be greater than 0"));
    }
    if cdn.top_k == 0 {
        errors.push(ValidationError::new("cdn.top_k", "must be greater than 0"));
    }

    // Negated comparisons so NaN is rejected too.
    if !(scoring.success_rate_weight > 0.0) {
        errors.push(ValidationError::new("scoring.success_rate_weight", "must be positive"));
    }
    if !(scoring.avg_delay_weight > 0.0) {
        errors.push(ValidationError::new("scoring.avg_delay_weight", "must be positive"));
    }
    if !(scoring.success_rate_weight > scoring.avg_delay_weight) {
        errors.push(ValidationError::new(
            "scoring.success_rate_weight",
            format!(
                "must exceed avg_delay_weight ({} <= {})",
                scoring.success_rate_weight, scoring.avg_delay_weight
            ),
        ));
    }
    if !(scoring.base_delay_ms > 0.0) || !scoring.base_delay_ms.is_finite() {
        errors.push(ValidationError::new("scoring.base_delay_ms", "must be a positive number"));
    }
    if scoring.delay_window == 0 {
        errors.push(ValidationError::new("scoring.delay_window", "must hold at least one sample"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
