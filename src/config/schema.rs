//! Configuration schema definitions.
//!
//! This module defines the raw, file-facing configuration for the broker.
//! All types derive Serde traits for deserialization from config files.
//! Cluster sections are the pre-validation shape; the typed, defaulted form
//! lives in [`crate::cluster::ClusterConfig`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration for the search broker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BrokerConfig {
    /// Listener configuration (bind address, inbound timeout).
    pub listener: ListenerConfig,

    /// Per-role cluster settings.
    pub clusters: ClustersConfig,

    /// Global request defaults shared by all cluster roles.
    pub defaults: RequestDefaults,

    /// Readiness probing settings.
    pub health_check: HealthCheckConfig,

    /// Proxy relay policy.
    pub proxy: ProxyPolicyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Inbound request timeout in seconds. Should exceed the upstream
    /// request timeout so upstream failures surface as 502/504 rather
    /// than an inbound cutoff.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// The fixed set of cluster roles.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClustersConfig {
    /// Serves user queries; the proxy forwards to this role.
    pub data: ClusterSettings,

    /// Serves management operations; readiness probes this role.
    pub admin: ClusterSettings,

    /// Optional third role with independent settings.
    pub tribe: Option<ClusterSettings>,
}

/// Raw per-role cluster settings, before defaulting and validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Base URL of the cluster (http or https).
    pub url: String,

    /// Basic-auth credentials, applied when a request carries no
    /// pass-through authorization of its own.
    pub username: Option<String>,
    pub password: Option<String>,

    /// Outbound TLS material.
    pub ssl: SslSettings,

    /// Per-request timeout in milliseconds. Falls back to the global
    /// default when unset.
    pub request_timeout_ms: Option<u64>,

    /// Status-probe timeout in milliseconds. Defaults to the request
    /// timeout when unset.
    pub ping_timeout_ms: Option<u64>,

    /// Shard timeout injected into search requests, in milliseconds.
    /// Zero disables injection.
    pub shard_timeout_ms: Option<u64>,

    /// Timeout for each startup readiness probe, in milliseconds.
    pub startup_timeout_ms: Option<u64>,

    /// Operator-configured headers added to every forwarded request.
    pub custom_headers: HashMap<String, String>,

    /// Inbound header names allowed through to the cluster.
    /// Defaults to ["authorization"] when unset.
    pub request_headers_whitelist: Option<Vec<String>>,

    /// Advertised API version of the cluster.
    pub api_version: Option<String>,

    /// Log every forwarded query at debug level.
    pub log_queries: bool,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            ssl: SslSettings::default(),
            request_timeout_ms: None,
            ping_timeout_ms: None,
            shard_timeout_ms: None,
            startup_timeout_ms: None,
            custom_headers: HashMap::new(),
            request_headers_whitelist: None,
            api_version: None,
            log_queries: false,
        }
    }
}

/// Outbound TLS settings for a cluster.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SslSettings {
    /// Certificate verification mode. Defaults to "full" when unset.
    pub verification_mode: Option<VerificationMode>,

    /// Additional trusted root certificates (PEM paths), in order.
    pub certificate_authorities: Vec<PathBuf>,

    /// Client certificate (PEM path) for mutual TLS.
    pub certificate: Option<PathBuf>,

    /// Client private key (PKCS#8 PEM path) for mutual TLS.
    pub key: Option<PathBuf>,

    /// Passphrase for an encrypted private key.
    pub key_passphrase: Option<String>,

    /// Present the client certificate even when the server does not
    /// request it.
    pub always_present_certificate: bool,
}

/// How strictly the upstream server certificate is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// No verification at all. Valid but insecure.
    None,
    /// Verify the certificate chain, skip hostname checks.
    Certificate,
    /// Verify chain and hostname.
    #[default]
    Full,
}

/// Global request defaults, overridable per cluster role.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Default per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Default shard timeout in milliseconds. Zero disables injection.
    pub shard_timeout_ms: u64,

    /// Default per-probe timeout during startup, in milliseconds.
    pub startup_timeout_ms: u64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            shard_timeout_ms: 0,
            startup_timeout_ms: 5_000,
        }
    }
}

/// Readiness probing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Delay between failed probes, in milliseconds.
    pub delay_ms: u64,

    /// Optional cap on probe attempts. Unset means retry indefinitely.
    /// Setting a cap deviates from the default wait-forever policy: the
    /// gate moves to `failed` and waiters are told to give up.
    pub max_attempts: Option<u32>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2_500,
            max_attempts: None,
        }
    }
}

/// Proxy relay policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyPolicyConfig {
    /// Upstream response headers relayed to the client. Everything else
    /// is dropped so backend topology details never leak.
    pub response_headers_allowlist: Vec<String>,

    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ProxyPolicyConfig {
    fn default() -> Self {
        Self {
            response_headers_allowlist: vec![
                "content-type".to_string(),
                "warning".to_string(),
            ],
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
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
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = BrokerConfig::default();
        assert_eq!(config.health_check.delay_ms, 2_500);
        assert_eq!(config.health_check.max_attempts, None);
        assert_eq!(config.defaults.request_timeout_ms, 30_000);
        assert!(config.clusters.tribe.is_none());
        assert!(config
            .proxy
            .response_headers_allowlist
            .contains(&"content-type".to_string()));
    }

    #[test]
    fn parses_minimal_toml() {
        let config: BrokerConfig = toml::from_str(
            r#"
            [clusters.data]
            url = "https://es-data:9200"
            request_timeout_ms = 1000

            [clusters.admin]
            url = "https://es-admin:9200"

            [health_check]
            delay_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.clusters.data.url, "https://es-data:9200");
        assert_eq!(config.clusters.data.request_timeout_ms, Some(1000));
        assert_eq!(config.health_check.delay_ms, 500);
        // Unmentioned sections fall back to defaults.
        assert_eq!(config.clusters.admin.ssl.verification_mode, None);
    }

    #[test]
    fn parses_verification_mode_values() {
        for (raw, expected) in [
            ("none", VerificationMode::None),
            ("certificate", VerificationMode::Certificate),
            ("full", VerificationMode::Full),
        ] {
            let config: BrokerConfig = toml::from_str(&format!(
                "[clusters.data.ssl]\nverification_mode = \"{raw}\"\n"
            ))
            .unwrap();
            assert_eq!(config.clusters.data.ssl.verification_mode, Some(expected));
        }
    }
}
