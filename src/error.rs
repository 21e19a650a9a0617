//! Error taxonomy for the gateway.
//!
//! # Kinds
//! - [`ConfigError`]: anything wrong with the configuration. Fatal at startup.
//! - [`TransportError`]: a single upstream exchange failed. Per-request, becomes a 502.
//! - [`ForwardError`]: everything the forwarding pipeline can fail with.
//!
//! A redirect whose `Location` cannot be mapped back through the gateway is
//! not an error at all; see [`crate::forward::rewrite::RewriteSkipped`].

use std::fmt;
use std::path::PathBuf;

use crate::config::validation::ValidationError;

/// Boxed error used as the cause of upstream failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while loading or applying configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The origin URL cannot describe a forwarding target.
    #[error("invalid origin url {url:?}: {reason}")]
    InvalidOrigin { url: String, reason: String },

    #[error("failed to read CA file {path}: {source}")]
    CaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stage of the upstream exchange that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// DNS resolution or TCP connect.
    Dial,
    /// TLS handshake failed or timed out.
    Tls,
    /// Writing the request head or body.
    Write,
    /// Connection failed or closed while waiting for the response.
    Read,
    /// The origin answered with something that is not HTTP.
    Protocol,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Dial => "dial",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Write => "write",
            TransportErrorKind::Read => "read",
            TransportErrorKind::Protocol => "protocol",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed exchange with the origin. Never retried.
#[derive(Debug, thiserror::Error)]
#[error("upstream {kind} failure")]
pub struct TransportError {
    kind: TransportErrorKind,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

/// Returned by a response rewriter that refuses a response.
#[derive(Debug, thiserror::Error)]
#[error("response rewrite failed: {reason}")]
pub struct RewriteError {
    pub reason: String,
}

/// Any failure of the forwarding pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("could not build outbound request")]
    Direct(#[from] axum::http::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl ForwardError {
    /// Short label for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Direct(_) => "direct",
            ForwardError::Transport(e) => e.kind().as_str(),
            ForwardError::Rewrite(_) => "rewrite",
        }
    }
}

/// Render an error with its whole `source()` chain, `outer: inner: root`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels() {
        assert_eq!(TransportErrorKind::Dial.to_string(), "dial");
        assert_eq!(TransportErrorKind::Protocol.to_string(), "protocol");
    }

    #[test]
    fn forward_error_reports_transport_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ForwardError::from(TransportError::new(TransportErrorKind::Dial, io));
        assert_eq!(err.kind(), "dial");
    }

    #[test]
    fn chain_includes_root_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = TransportError::new(TransportErrorKind::Dial, io);
        assert_eq!(error_chain(&err), "upstream dial failure: connection refused");
    }
}
