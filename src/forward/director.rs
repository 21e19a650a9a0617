//! Request director: builds the outbound request from the inbound one.
//!
//! # Responsibilities
//! - Point the request at the origin (scheme, authority, prefixed path)
//! - Keep the query string byte-for-byte
//! - Record the client-facing host in `X-Forwarded-Host`
//! - Record the origin in `X-Origin-Host` and `Host`
//!
//! # Design Decisions
//! - The inbound request is consumed and a fresh outbound value is built;
//!   headers are copied entry by entry, so each value appears exactly once
//! - Bodies are moved across untouched, never buffered

use std::sync::Arc;

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Request, Uri, Version};

use crate::forward::Origin;
use crate::http::headers::{X_FORWARDED_HOST, X_ORIGIN_HOST};

/// Rewrites gateway-addressed requests into origin-addressed ones.
#[derive(Debug, Clone)]
pub struct Director {
    origin: Arc<Origin>,
}

impl Director {
    pub fn new(origin: Arc<Origin>) -> Self {
        Self { origin }
    }

    /// Build the outbound request. The body stream is moved, not copied.
    pub fn direct<B>(&self, inbound: Request<B>) -> Result<Request<B>, axum::http::Error> {
        let (parts, body) = inbound.into_parts();

        let uri = self.outbound_uri(&parts.uri)?;
        let forwarded_host = inbound_host(&parts);

        let mut headers = HeaderMap::with_capacity(parts.headers.len() + 3);
        for (name, value) in parts.headers.iter() {
            if *name == header::HOST || *name == X_FORWARDED_HOST || *name == X_ORIGIN_HOST {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        headers.insert(header::HOST, self.origin.authority_header().clone());
        if let Some(host) = forwarded_host {
            headers.insert(X_FORWARDED_HOST, host);
        }
        headers.insert(X_ORIGIN_HOST, self.origin.authority_header().clone());

        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(uri)
            // The upstream leg is always HTTP/1.1, whatever the client spoke.
            .version(Version::HTTP_11)
            .body(body)?;
        *outbound.headers_mut() = headers;
        Ok(outbound)
    }

    fn outbound_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let mut path_and_query = self.origin.join_path(inbound.path());
        if let Some(query) = inbound.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        Uri::builder()
            .scheme(self.origin.scheme().clone())
            .authority(self.origin.authority().clone())
            .path_and_query(path_and_query)
            .build()
    }
}

/// Host the client addressed: `Host` for HTTP/1, the URI authority for HTTP/2.
fn inbound_host(parts: &Parts) -> Option<HeaderValue> {
    parts.headers.get(header::HOST).cloned().or_else(|| {
        parts
            .uri
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn director(origin: &str) -> Director {
        Director::new(Arc::new(Origin::parse(origin).unwrap()))
    }

    fn inbound(uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::HOST, "gateway.local:8080")
    }

    #[test]
    fn rewrites_destination_and_keeps_query() {
        let req = inbound("/articles/1?lang=en")
            .header(header::ACCEPT, "text/html")
            .body(())
            .unwrap();

        let out = director("https://origin.example").direct(req).unwrap();

        assert_eq!(*out.method(), Method::GET);
        assert_eq!(out.uri().to_string(), "https://origin.example/articles/1?lang=en");
        assert_eq!(out.headers()[header::ACCEPT], "text/html");
        assert_eq!(out.headers()[X_FORWARDED_HOST], "gateway.local:8080");
        assert_eq!(out.headers()[X_ORIGIN_HOST], "origin.example");
        assert_eq!(out.headers()[header::HOST], "origin.example");
        assert_eq!(out.version(), Version::HTTP_11);
    }

    #[test]
    fn prepends_origin_prefix() {
        let req = inbound("/x/y?b=2&a=1").body(()).unwrap();
        let out = director("http://10.0.0.5:8080/app").direct(req).unwrap();
        assert_eq!(out.uri().to_string(), "http://10.0.0.5:8080/app/x/y?b=2&a=1");
        assert_eq!(out.headers()[header::HOST], "10.0.0.5:8080");
    }

    #[test]
    fn query_is_byte_identical() {
        let req = inbound("/search?q=a%20b&&empty=&q=a+b").body(()).unwrap();
        let out = director("https://origin.example").direct(req).unwrap();
        assert_eq!(out.uri().query(), Some("q=a%20b&&empty=&q=a+b"));
    }

    #[test]
    fn copies_every_header_exactly_once() {
        let req = inbound("/")
            .header("x-trace", "one")
            .header("x-trace", "two")
            .header(header::COOKIE, "a=1")
            .body(())
            .unwrap();

        let out = director("https://origin.example").direct(req).unwrap();

        let traces: Vec<_> = out.headers().get_all("x-trace").iter().collect();
        assert_eq!(traces, vec!["one", "two"]);
        assert_eq!(out.headers().get_all(header::COOKIE).iter().count(), 1);
        assert_eq!(out.headers().get_all(header::HOST).iter().count(), 1);
        // cookie, x-trace x2, host, x-forwarded-host, x-origin-host
        assert_eq!(out.headers().len(), 6);
    }

    #[test]
    fn client_supplied_forwarding_headers_are_replaced() {
        let req = inbound("/")
            .header(X_FORWARDED_HOST, "spoofed.example")
            .header(X_ORIGIN_HOST, "spoofed.example")
            .body(())
            .unwrap();
        let out = director("https://origin.example").direct(req).unwrap();
        let forwarded: Vec<_> = out.headers().get_all(X_FORWARDED_HOST).iter().collect();
        assert_eq!(forwarded, vec!["gateway.local:8080"]);
        assert_eq!(out.headers()[X_ORIGIN_HOST], "origin.example");
    }

    #[test]
    fn http2_request_uses_uri_authority() {
        let req = Request::builder()
            .uri("https://gateway.example/path")
            .version(Version::HTTP_2)
            .body(())
            .unwrap();
        let out = director("https://origin.example").direct(req).unwrap();
        assert_eq!(out.headers()[X_FORWARDED_HOST], "gateway.example");
        assert_eq!(out.version(), Version::HTTP_11);
    }

    #[test]
    fn body_is_moved_through() {
        let req = inbound("/upload").method(Method::POST).body("payload").unwrap();
        let out = director("https://origin.example").direct(req).unwrap();
        assert_eq!(*out.method(), Method::POST);
        assert_eq!(*out.body(), "payload");
    }
}
