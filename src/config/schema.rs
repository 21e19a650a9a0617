//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// The single upstream every request is forwarded to.
    pub origin: OriginConfig,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound transport: pooling, TLS trust, compression.
    pub transport: TransportConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OriginConfig {
    /// Origin URL, e.g. "https://www.example.com" or "http://10.0.0.5:8080/app".
    pub url: String,
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

/// How the origin's certificate chain is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustMode {
    /// Validate against the platform roots plus any configured CA file.
    Verify,
    /// Accept any certificate. Development only.
    SkipVerify,
}

/// Outbound transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Disable certificate verification for the origin.
    ///
    /// WARNING: this turns TLS into encryption without authentication. It
    /// exists for development against self-signed origins only.
    pub tls_skip_verify: bool,

    /// Extra PEM trust anchors added to the platform roots.
    pub ca_file: Option<PathBuf>,

    /// Idle pooled connections kept per host. Zero disables reuse.
    pub max_idle_connections: usize,

    /// Seconds an idle pooled connection is kept before it is closed.
    pub idle_timeout_secs: u64,

    /// Seconds a TLS handshake may take before the attempt is abandoned.
    pub tls_handshake_timeout_secs: u64,

    /// Seconds DNS resolution plus TCP connect may take.
    pub connect_timeout_secs: u64,

    /// Pin `Accept-Encoding: identity` on every outbound request.
    pub disable_compression: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls_skip_verify: false,
            ca_file: None,
            max_idle_connections: 10,
            idle_timeout_secs: 90,
            tls_handshake_timeout_secs: 10,
            connect_timeout_secs: 30,
            disable_compression: false,
        }
    }
}

impl TransportConfig {
    pub fn trust_mode(&self) -> TrustMode {
        if self.tls_skip_verify {
            TrustMode::SkipVerify
        } else {
            TrustMode::Verify
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn tls_handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_handshake_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Human-readable text or one JSON object per line.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "reverse_gateway=info,tower_http=info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
