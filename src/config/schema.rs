//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// How inbound requests are turned into snapshots.
    pub snapshot: SnapshotConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
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

/// Request snapshot settings used by the axum adapter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Path the application is mounted under (e.g., "/" or "/myapp/").
    pub application_path: String,

    /// Scheme assumed when neither the request nor a trusted proxy reports one.
    pub default_scheme: String,

    /// Honour X-Forwarded-Proto / X-Forwarded-Host from a fronting proxy.
    pub trust_forwarded_headers: bool,

    /// Maximum accepted size of a url-encoded form body in bytes.
    pub max_form_bytes: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            application_path: "/".to_string(),
            default_scheme: "http".to_string(),
            trust_forwarded_headers: false,
            max_form_bytes: 256 * 1024, // SAML responses with embedded certificates get large
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.snapshot.application_path, "/");
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_partial_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [snapshot]
            application_path = "/myapp/"
            trust_forwarded_headers = true
            "#,
        )
        .unwrap();

        assert_eq!(config.snapshot.application_path, "/myapp/");
        assert!(config.snapshot.trust_forwarded_headers);
        assert_eq!(config.snapshot.default_scheme, "http");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
