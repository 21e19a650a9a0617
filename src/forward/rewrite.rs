//! Response rewriting.
//!
//! # Responsibilities
//! - Post-process a successful upstream response before it is relayed
//! - Keep redirects pointing at the gateway instead of the origin
//!
//! # Design Decisions
//! - Strategy trait, invoked synchronously by the engine
//! - `Location` is resolved against the outbound request URI
//! - Same-origin targets outside the path prefix are made absolute, since a
//!   relative reference would be remapped under the prefix by the gateway
//! - A `Location` that cannot be mapped is passed through, never an error

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderValue, LOCATION};
use axum::http::Uri;
use axum::response::Response;
use url::Url;

use crate::error::RewriteError;
use crate::forward::Origin;
use crate::observability::metrics;

/// Post-processes upstream responses.
///
/// `request` is the outbound URI the response answers. Returning an error
/// turns the exchange into a forwarding failure, handled by the engine's
/// error translator.
pub trait ResponseRewriter: Send + Sync {
    fn rewrite(&self, request: &Uri, response: Response<Body>) -> Result<Response<Body>, RewriteError>;
}

/// Why a redirect was relayed with its `Location` untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteSkipped {
    #[error("no Location header")]
    Missing,
    #[error("Location is not valid UTF-8")]
    NotUtf8,
    #[error("Location does not resolve against the request: {0}")]
    Unresolvable(url::ParseError),
    #[error("Location points outside the origin")]
    Foreign,
}

/// Replacement `Location` for a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// Reachable through the gateway; the value is gateway-relative.
    Gateway(HeaderValue),
    /// On the origin but outside its path prefix; the value is the absolute origin URL.
    Origin(HeaderValue),
}

/// Default rewriter: maps same-origin redirect targets to gateway-relative references.
#[derive(Debug, Clone)]
pub struct RedirectRewriter {
    origin: Arc<Origin>,
}

impl RedirectRewriter {
    pub fn new(origin: Arc<Origin>) -> Self {
        Self { origin }
    }

    /// Compute the replacement `Location` for a redirect answering `request`.
    pub fn relocate(&self, request: &Uri, headers: &HeaderMap) -> Result<Relocation, RewriteSkipped> {
        let location = headers.get(LOCATION).ok_or(RewriteSkipped::Missing)?;
        let location = location.to_str().map_err(|_| RewriteSkipped::NotUtf8)?;
        let resolved = self
            .request_url(request)
            .and_then(|base| base.join(location))
            .map_err(RewriteSkipped::Unresolvable)?;
        if !self.origin.is_same_origin(&resolved) {
            return Err(RewriteSkipped::Foreign);
        }

        // Built from a parsed URL, so always a valid header value.
        match self.origin.gateway_reference(&resolved) {
            Some(reference) => HeaderValue::from_str(&reference)
                .map(Relocation::Gateway)
                .map_err(|_| RewriteSkipped::NotUtf8),
            None => HeaderValue::from_str(resolved.as_str())
                .map(Relocation::Origin)
                .map_err(|_| RewriteSkipped::NotUtf8),
        }
    }

    /// Absolute origin URL of the outbound request.
    fn request_url(&self, request: &Uri) -> Result<Url, url::ParseError> {
        let path_and_query = request.path_and_query().map_or("/", |pq| pq.as_str());
        self.origin.url().join(path_and_query)
    }
}

impl ResponseRewriter for RedirectRewriter {
    fn rewrite(&self, request: &Uri, mut response: Response<Body>) -> Result<Response<Body>, RewriteError> {
        if !response.status().is_redirection() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        match self.relocate(request, response.headers()) {
            Ok(Relocation::Gateway(location)) => {
                tracing::debug!(status, location = ?location, "Redirect rewritten to gateway-relative location");
                response.headers_mut().insert(LOCATION, location);
                metrics::record_redirect_rewritten();
            }
            Ok(Relocation::Origin(location)) => {
                tracing::warn!(
                    status,
                    location = ?location,
                    prefix = self.origin.path_prefix(),
                    "Redirect leaves the origin path prefix; relaying absolute origin location"
                );
                response.headers_mut().insert(LOCATION, location);
            }
            Err(skipped) => {
                tracing::debug!(status, reason = %skipped, "Redirect relayed unchanged");
            }
        }
        Ok(response)
    }
}
