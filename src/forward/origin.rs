//! Origin descriptor: the immutable identity of the upstream.

use std::fmt;

use axum::http::uri::{Authority, Scheme};
use axum::http::HeaderValue;
use url::Url;

use crate::error::ConfigError;

/// Scheme, authority and optional path prefix of the single upstream.
///
/// Built once from the configured URL and shared read-only (behind an
/// `Arc`) by the director and the response rewriter.
#[derive(Debug, Clone)]
pub struct Origin {
    url: Url,
    scheme: Scheme,
    authority: Authority,
    authority_header: HeaderValue,
    /// Path prefix without trailing slash; empty when the origin is rooted at `/`.
    prefix: String,
}

impl Origin {
    /// Parse and validate an origin URL.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidOrigin {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            _ => return Err(invalid("scheme must be http or https")),
        };
        let host = url.host_str().ok_or_else(|| invalid("host is missing"))?;
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not allowed in the origin url"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed in the origin url"));
        }

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority_header =
            HeaderValue::from_str(&authority).map_err(|e| invalid(&e.to_string()))?;
        let authority = authority
            .parse::<Authority>()
            .map_err(|e| invalid(&e.to_string()))?;
        let prefix = url.path().trim_end_matches('/').to_string();

        Ok(Self {
            url,
            scheme,
            authority,
            authority_header,
            prefix,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn is_https(&self) -> bool {
        self.scheme == Scheme::HTTPS
    }

    /// Host plus explicit port, as sent in `Host` and `X-Origin-Host`.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn authority_header(&self) -> &HeaderValue {
        &self.authority_header
    }

    pub fn path_prefix(&self) -> &str {
        &self.prefix
    }

    /// Map a gateway path onto the origin: prefix and path joined by one slash.
    pub fn join_path(&self, path: &str) -> String {
        match (self.prefix.is_empty(), path.starts_with('/')) {
            (true, true) => path.to_string(),
            (true, false) => format!("/{path}"),
            (false, true) => format!("{}{}", self.prefix, path),
            (false, false) => format!("{}/{}", self.prefix, path),
        }
    }

    /// Scheme, host and effective port all match this origin.
    pub fn is_same_origin(&self, target: &Url) -> bool {
        target.scheme() == self.url.scheme()
            && target.host_str() == self.url.host_str()
            && target.port_or_known_default() == self.url.port_or_known_default()
    }

    /// Inverse of [`Origin::join_path`] for an absolute URL.
    ///
    /// Returns the gateway-relative reference (path, query, fragment) when
    /// `target` lives on this origin under its prefix, `None` otherwise.
    pub fn gateway_reference(&self, target: &Url) -> Option<String> {
        if !self.is_same_origin(target) {
            return None;
        }

        let path = target.path();
        let mut reference = if self.prefix.is_empty() {
            path.to_string()
        } else if path == self.prefix {
            "/".to_string()
        } else {
            let rest = path.strip_prefix(self.prefix.as_str())?;
            if !rest.starts_with('/') {
                return None;
            }
            rest.to_string()
        };

        if let Some(query) = target.query() {
            reference.push('?');
            reference.push_str(query);
        }
        if let Some(fragment) = target.fragment() {
            reference.push('#');
            reference.push_str(fragment);
        }
        Some(reference)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.prefix)
    }
}
