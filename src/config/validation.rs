//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the application path resolves to a url
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("snapshot.application_path '{0}' does not resolve to a url")]
    InvalidApplicationPath(String),

    #[error("snapshot.default_scheme must be http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("snapshot.max_form_bytes must be greater than zero")]
    ZeroFormLimit,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let snapshot = &config.snapshot;
    let resolved = Url::parse("http://localhost/").and_then(|base| base.join(&snapshot.application_path));
    if resolved.is_err() {
        errors.push(ValidationError::InvalidApplicationPath(
            snapshot.application_path.clone(),
        ));
    }

    if !matches!(snapshot.default_scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::UnsupportedScheme(
            snapshot.default_scheme.clone(),
        ));
    }

    if snapshot.max_form_bytes == 0 {
        errors.push(ValidationError::ZeroFormLimit);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
