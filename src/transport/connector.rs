//! Connector used by the pooled client to open new origin connections.
//!
//! Dialing and the TLS handshake are separate steps so each is bounded by
//! its own timeout and reports its own [`TransportErrorKind`].

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::http::uri::{Scheme, Uri};
use hyper::rt::{Read, ReadBufCursor, Write};
use hyper_util::client::legacy::connect::{Connected, Connection, HttpConnector};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tower::Service;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportErrorKind};

#[derive(Debug, thiserror::Error)]
#[error("TLS handshake did not complete within {0:?}")]
struct HandshakeTimedOut(Duration);

#[derive(Debug, thiserror::Error)]
#[error("origin uses https but no TLS connector is configured")]
struct TlsNotConfigured;

/// Dials the origin and, for `https`, performs the TLS handshake.
#[derive(Clone)]
pub struct OriginConnector {
    http: HttpConnector,
    tls: Option<TlsConnector>,
    handshake_timeout: Duration,
}

impl OriginConnector {
    pub fn new(config: &TransportConfig, tls: Option<TlsConnector>) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(config.connect_timeout()));

        Self {
            http,
            tls,
            handshake_timeout: config.tls_handshake_timeout(),
        }
    }
}

impl Service<Uri> for OriginConnector {
    type Response = OriginStream;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<OriginStream, TransportError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.http
            .poll_ready(cx)
            .map_err(|e| TransportError::new(TransportErrorKind::Dial, e))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let mut http = self.http.clone();
        let tls = self.tls.clone();
        let handshake_timeout = self.handshake_timeout;

        Box::pin(async move {
            let https = uri.scheme() == Some(&Scheme::HTTPS);
            let server_name = if https { Some(server_name(&uri)?) } else { None };

            let tcp = http
                .call(uri)
                .await
                .map_err(|e| TransportError::new(TransportErrorKind::Dial, e))?;

            let Some(server_name) = server_name else {
                return Ok(OriginStream::Plain(tcp));
            };
            let tls = tls.ok_or_else(|| TransportError::new(TransportErrorKind::Tls, TlsNotConfigured))?;

            let stream = tokio::time::timeout(
                handshake_timeout,
                tls.connect(server_name, tcp.into_inner()),
            )
            .await
            .map_err(|_| {
                TransportError::new(TransportErrorKind::Tls, HandshakeTimedOut(handshake_timeout))
            })?
            .map_err(|e| TransportError::new(TransportErrorKind::Tls, e))?;

            tracing::trace!("TLS handshake with origin complete");
            Ok(OriginStream::Tls(TokioIo::new(stream)))
        })
    }
}

/// SNI name for the origin host. IPv6 literals lose their brackets.
fn server_name(uri: &Uri) -> Result<ServerName<'static>, TransportError> {
    let host = uri.host().unwrap_or_default();
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host.to_string())
        .map_err(|e| TransportError::new(TransportErrorKind::Tls, e))
}

/// An origin connection, plain or TLS.
pub enum OriginStream {
    Plain(TokioIo<TcpStream>),
    Tls(TokioIo<TlsStream<TcpStream>>),
}

impl Connection for OriginStream {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}

impl Read for OriginStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            OriginStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            OriginStream::Tls(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl Write for OriginStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            OriginStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            OriginStream::Tls(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            OriginStream::Plain(s) => Pin::new(s).poll_flush(cx),
            OriginStream::Tls(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            OriginStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            OriginStream::Tls(s) => Pin::new(s).poll_shutdown(cx),
        }
    }

    fn is_write_vectored(&self) -> bool {
        match self {
            OriginStream::Plain(s) => s.is_write_vectored(),
            OriginStream::Tls(s) => s.is_write_vectored(),
        }
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            OriginStream::Plain(s) => Pin::new(s).poll_write_vectored(cx, bufs),
            OriginStream::Tls(s) => Pin::new(s).poll_write_vectored(cx, bufs),
        }
    }
}
