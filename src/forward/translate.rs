//! Error translation: every forwarding failure becomes the same 502.

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use uuid::Uuid;

use crate::error::{error_chain, ForwardError};

/// Body sent to the client for any upstream failure.
pub const PROXY_ERROR_BODY: &str = "Proxy Error";

/// What the translator knows about the request that failed.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub request_id: Uuid,
    pub method: Method,
    pub path: String,
}

/// Turns a forwarding failure into the response the client sees.
///
/// Implementations must always produce a well-formed response.
pub trait ErrorTranslator: Send + Sync {
    fn translate(&self, request: &RequestSummary, error: &ForwardError) -> Response<Body>;
}

/// Default translator: one `error!` record, then `502 Proxy Error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BadGatewayTranslator;

impl ErrorTranslator for BadGatewayTranslator {
    fn translate(&self, request: &RequestSummary, error: &ForwardError) -> Response<Body> {
        tracing::error!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            kind = error.kind(),
            error = %error_chain(error),
            "Proxy error"
        );
        bad_gateway()
    }
}

/// The fixed upstream-unavailable response.
pub fn bad_gateway() -> Response<Body> {
    let mut response = Response::new(Body::from(PROXY_ERROR_BODY));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, TransportErrorKind};

    #[tokio::test]
    async fn always_502_with_fixed_body() {
        let summary = RequestSummary {
            request_id: Uuid::new_v4(),
            method: Method::GET,
            path: "/".into(),
        };
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = ForwardError::from(TransportError::new(TransportErrorKind::Dial, io));

        let response = BadGatewayTranslator.translate(&summary, &error);

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], PROXY_ERROR_BODY.as_bytes());
    }
}
