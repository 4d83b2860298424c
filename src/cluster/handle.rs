//! Live per-role cluster clients.
//!
//! # Responsibilities
//! - Assemble connection parameters (TLS material, auth, timeouts) into
//!   one shared client per cluster role
//! - Forward requests and issue reachability probes
//!
//! # Design Decisions
//! - Connections are opened lazily by the client's pool, not here
//! - Configured basic auth is a fallback; a pass-through authorization
//!   header from the caller always wins
//! - Node discovery, sniffing and retries stay with the client library

use std::fs;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Body, Certificate, Identity, Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::cluster::config::ClusterConfig;
use crate::config::{ConfigError, VerificationMode};

/// Owns one live client bound to exactly one [`ClusterConfig`].
///
/// Created once per role at startup and shared by all concurrent callers;
/// the underlying pool supports concurrent use.
#[derive(Debug)]
pub struct ClusterHandle {
    config: ClusterConfig,
    client: reqwest::Client,
    status_url: Url,
}

/// Error forwarding a single request to the cluster.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid forward path {path:?}: {reason}")]
    Path { path: String, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ClusterHandle {
    /// Build the client for a cluster role.
    ///
    /// Reads certificate material from the configured paths; this is the
    /// only file access the subsystem performs.
    pub fn new(config: ClusterConfig) -> Result<Self, ConfigError> {
        let client = build_client(&config)?;
        let status_url =
            config
                .url
                .join("/_cluster/health")
                .map_err(|e| ConfigError::InvalidUrl {
                    cluster: config.name.clone(),
                    url: config.url.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(Self {
            config,
            client,
            status_url,
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Forward a request to the cluster, path and query verbatim.
    ///
    /// `headers` is the already-filtered outbound header map. The
    /// configured request timeout bounds the whole exchange.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Body,
    ) -> Result<reqwest::Response, ForwardError> {
        let url = self
            .config
            .url
            .join(path_and_query)
            .map_err(|e| ForwardError::Path {
                path: path_and_query.to_string(),
                reason: e.to_string(),
            })?;

        if self.config.log_queries {
            tracing::debug!(
                cluster = %self.config.name,
                method = %method,
                url = %url,
                "forwarding query"
            );
        }

        let authenticated = headers.contains_key(AUTHORIZATION);
        let mut request = self
            .client
            .request(method, url)
            .headers(headers)
            .timeout(self.config.request_timeout)
            .body(body);

        if !authenticated {
            if let Some(username) = &self.config.username {
                request = request.basic_auth(username, self.config.password.as_deref());
            }
        }

        Ok(request.send().await?)
    }

    /// Lightweight status request; only reachability matters.
    ///
    /// Bounded by the ping timeout. Returns the raw status code; the
    /// caller decides what counts as healthy.
    pub async fn status(&self) -> Result<StatusCode, reqwest::Error> {
        let mut request = self
            .client
            .get(self.status_url.clone())
            .timeout(self.config.ping_timeout);

        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        request.send().await.map(|response| response.status())
    }
}

fn build_client(config: &ClusterConfig) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .default_headers(custom_header_map(config)?);

    match config.ssl.verification_mode {
        VerificationMode::Full => {}
        VerificationMode::Certificate => {
            builder = builder.danger_accept_invalid_hostnames(true);
        }
        VerificationMode::None => {
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    for path in &config.ssl.certificate_authorities {
        let pem = fs::read(path).map_err(|e| ConfigError::SslFile {
            cluster: config.name.clone(),
            path: path.clone(),
            source: e,
        })?;
        let certificate = Certificate::from_pem(&pem).map_err(|e| ConfigError::Client {
            cluster: config.name.clone(),
            reason: format!("invalid certificate authority {path:?}: {e}"),
        })?;
        builder = builder.add_root_certificate(certificate);
    }

    if let (Some(cert_path), Some(key_path)) = (&config.ssl.certificate, &config.ssl.key) {
        if config.ssl.key_passphrase.is_some() {
            return Err(ConfigError::SslMaterial {
                cluster: config.name.clone(),
                reason: "encrypted private keys are not supported, decrypt the key first"
                    .to_string(),
            });
        }
        let cert = fs::read(cert_path).map_err(|e| ConfigError::SslFile {
            cluster: config.name.clone(),
            path: cert_path.clone(),
            source: e,
        })?;
        let key = fs::read(key_path).map_err(|e| ConfigError::SslFile {
            cluster: config.name.clone(),
            path: key_path.clone(),
            source: e,
        })?;
        let identity = Identity::from_pkcs8_pem(&cert, &key).map_err(|e| ConfigError::Client {
            cluster: config.name.clone(),
            reason: format!("invalid client certificate/key pair: {e}"),
        })?;
        builder = builder.identity(identity);
    }

    builder.build().map_err(|e| ConfigError::Client {
        cluster: config.name.clone(),
        reason: e.to_string(),
    })
}

/// Operator-configured headers become client defaults so probes carry
/// them too; the header filter re-asserts them on forwarded requests.
fn custom_header_map(config: &ClusterConfig) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::with_capacity(config.custom_headers.len());
    for (name, value) in &config.custom_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::InvalidHeader {
                cluster: config.name.clone(),
                name: name.clone(),
            }
        })?;
        let value =
            HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader {
                cluster: config.name.clone(),
                name: name.to_string(),
            })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
