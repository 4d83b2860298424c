//! Typed cluster connection descriptors.
//!
//! # Responsibilities
//! - Apply defaulting rules to raw per-role settings
//! - Validate urls and TLS material before any client exists
//!
//! # Design Decisions
//! - Building is a pure function: no network, no file reads
//! - Certificate/key paths are carried, not opened; the handle reads them
//! - `verification_mode = "none"` is accepted (insecure but valid)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::config::schema::{ClusterSettings, RequestDefaults, SslSettings, VerificationMode};
use crate::config::ConfigError;

/// Immutable connection descriptor for one cluster role.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Role name ("data", "admin", "tribe").
    pub name: String,
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: SslConfig,
    pub request_timeout: Duration,
    /// Defaults to `request_timeout` when unset.
    pub ping_timeout: Duration,
    /// Zero disables shard-timeout injection.
    pub shard_timeout: Duration,
    pub startup_timeout: Duration,
    pub custom_headers: HashMap<String, String>,
    /// Lower-cased header names allowed through from inbound requests.
    pub request_headers_whitelist: Vec<String>,
    pub api_version: String,
    pub log_queries: bool,
}

/// Validated TLS material for one cluster role.
#[derive(Debug, Clone)]
pub struct SslConfig {
    pub verification_mode: VerificationMode,
    pub certificate_authorities: Vec<PathBuf>,
    pub certificate: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub key_passphrase: Option<String>,
    pub always_present_certificate: bool,
}

impl ClusterConfig {
    /// Build a cluster config from raw settings and global defaults.
    ///
    /// Defaulting: ping timeout falls back to the request timeout, the
    /// header whitelist falls back to `["authorization"]`, and the
    /// verification mode falls back to `full`.
    pub fn build(
        name: &str,
        settings: &ClusterSettings,
        defaults: &RequestDefaults,
    ) -> Result<Self, ConfigError> {
        let url = parse_cluster_url(name, &settings.url)?;
        let ssl = validate_ssl(name, &settings.ssl)?;

        let request_timeout = Duration::from_millis(
            settings
                .request_timeout_ms
                .unwrap_or(defaults.request_timeout_ms),
        );
        let ping_timeout = settings
            .ping_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(request_timeout);
        let shard_timeout = Duration::from_millis(
            settings.shard_timeout_ms.unwrap_or(defaults.shard_timeout_ms),
        );
        let startup_timeout = Duration::from_millis(
            settings
                .startup_timeout_ms
                .unwrap_or(defaults.startup_timeout_ms),
        );

        let request_headers_whitelist = settings
            .request_headers_whitelist
            .clone()
            .unwrap_or_else(|| vec!["authorization".to_string()])
            .into_iter()
            .map(|h| h.to_ascii_lowercase())
            .collect();

        Ok(Self {
            name: name.to_string(),
            url,
            username: settings.username.clone(),
            password: settings.password.clone(),
            ssl,
            request_timeout,
            ping_timeout,
            shard_timeout,
            startup_timeout,
            custom_headers: settings.custom_headers.clone(),
            request_headers_whitelist,
            api_version: settings
                .api_version
                .clone()
                .unwrap_or_else(|| "master".to_string()),
            log_queries: settings.log_queries,
        })
    }
}

fn parse_cluster_url(cluster: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        cluster: cluster.to_string(),
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            cluster: cluster.to_string(),
            url: raw.to_string(),
            reason: format!("unsupported scheme {other:?}, expected http or https"),
        }),
    }
}

fn validate_ssl(cluster: &str, ssl: &SslSettings) -> Result<SslConfig, ConfigError> {
    // Mutual TLS material must come as a pair.
    match (&ssl.certificate, &ssl.key) {
        (Some(_), None) => {
            return Err(ConfigError::SslMaterial {
                cluster: cluster.to_string(),
                reason: "certificate is set but key is missing".to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(ConfigError::SslMaterial {
                cluster: cluster.to_string(),
                reason: "key is set but certificate is missing".to_string(),
            })
        }
        _ => {}
    }

    if ssl.key_passphrase.is_some() && ssl.key.is_none() {
        return Err(ConfigError::SslMaterial {
            cluster: cluster.to_string(),
            reason: "key_passphrase is set but key is missing".to_string(),
        });
    }

    Ok(SslConfig {
        verification_mode: ssl.verification_mode.unwrap_or_default(),
        certificate_authorities: ssl.certificate_authorities.clone(),
        certificate: ssl.certificate.clone(),
        key: ssl.key.clone(),
        key_passphrase: ssl.key_passphrase.clone(),
        always_present_certificate: ssl.always_present_certificate,
    })
}
