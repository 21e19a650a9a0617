//! Transport manager: the pooled, TLS-capable client for the origin.
//!
//! # Data Flow
//! ```text
//! outbound request
//!     → strip hop-by-hop headers, apply compression policy
//!     → pooled client (reuse an idle connection or dial a new one)
//!         → connector.rs (TCP dial, then TLS handshake for https)
//!     → response head received
//!     → strip hop-by-hop headers, hand the streaming body back
//! ```
//!
//! # Design Decisions
//! - Pooling is delegated to hyper-util's client: idle connections per host
//!   are capped and evicted once the idle timeout elapses
//! - Every failure is classified into one [`TransportErrorKind`]
//! - No retries; a single attempt per call

pub mod connector;
pub mod tls;

use std::error::Error as StdError;
use std::io;

use axum::body::Body;
use axum::http::header::{HeaderValue, ACCEPT_ENCODING};
use axum::http::{Request, Response};
use hyper_util::client::legacy::{self, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::{TransportConfig, TrustMode};
use crate::error::{ConfigError, TransportError, TransportErrorKind};
use crate::forward::Origin;
use crate::http::headers::strip_hop_by_hop;

pub use connector::{OriginConnector, OriginStream};

/// Sends outbound requests to the origin over pooled connections.
///
/// Cloning is cheap and clones share the pool.
#[derive(Clone)]
pub struct Transport {
    client: Client<OriginConnector, Body>,
    compression: bool,
}

impl Transport {
    /// Build the transport. TLS material is only loaded for `https` origins.
    pub fn new(origin: &Origin, config: &TransportConfig) -> Result<Self, ConfigError> {
        let tls = if origin.is_https() {
            Some(tls::build_connector(config)?)
        } else {
            if config.trust_mode() == TrustMode::SkipVerify {
                tracing::warn!("tls_skip_verify is set but the origin is plain http");
            }
            None
        };

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.idle_timeout())
            .pool_timer(TokioTimer::new())
            .build(OriginConnector::new(config, tls));

        tracing::debug!(
            origin = %origin,
            max_idle_connections = config.max_idle_connections,
            idle_timeout_secs = config.idle_timeout_secs,
            tls_handshake_timeout_secs = config.tls_handshake_timeout_secs,
            compression = !config.disable_compression,
            "Transport ready"
        );

        Ok(Self {
            client,
            compression: !config.disable_compression,
        })
    }

    /// Send one request and return the response head with a streaming body.
    pub async fn send(&self, mut request: Request<Body>) -> Result<Response<Body>, TransportError> {
        strip_hop_by_hop(request.headers_mut());
        if !self.compression {
            request
                .headers_mut()
                .insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        }

        let response = self.client.request(request).await.map_err(classify)?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

fn classify(error: legacy::Error) -> TransportError {
    let kind = classify_kind(&error);
    TransportError::new(kind, error)
}

/// Walk the cause chain for the most specific stage that failed.
fn classify_kind(error: &legacy::Error) -> TransportErrorKind {
    let mut cause: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(current) = cause {
        // Raised by our connector, already classified.
        if let Some(transport) = current.downcast_ref::<TransportError>() {
            return transport.kind();
        }
        if let Some(hyper_error) = current.downcast_ref::<hyper::Error>() {
            return classify_hyper(hyper_error);
        }
        cause = current.source();
    }

    if error.is_connect() {
        TransportErrorKind::Dial
    } else {
        TransportErrorKind::Read
    }
}

fn classify_hyper(error: &hyper::Error) -> TransportErrorKind {
    if error.is_parse() || error.is_parse_status() || error.is_parse_too_large() {
        return TransportErrorKind::Protocol;
    }
    if error.is_user() || error.is_body_write_aborted() {
        return TransportErrorKind::Write;
    }
    let broken_pipe = error
        .source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|io| io.kind() == io::ErrorKind::BrokenPipe);
    if broken_pipe {
        TransportErrorKind::Write
    } else {
        TransportErrorKind::Read
    }
}
