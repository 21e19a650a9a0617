//! Forwarding engine: one request through director, transport and rewriter.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::TransportConfig;
use crate::error::{ConfigError, ForwardError};
use crate::forward::director::Director;
use crate::forward::rewrite::{RedirectRewriter, ResponseRewriter};
use crate::forward::translate::{BadGatewayTranslator, ErrorTranslator, RequestSummary};
use crate::forward::Origin;
use crate::observability::metrics;
use crate::transport::Transport;

/// Forwards every request to a single origin.
///
/// Per request: `received → directed → dispatched → {rewritten | errored} → relayed`.
/// A single attempt is made; failures go to the error translator and never
/// escape [`ForwardingEngine::forward`].
pub struct ForwardingEngine {
    origin: Arc<Origin>,
    director: Director,
    transport: Transport,
    rewriter: Box<dyn ResponseRewriter>,
    translator: Box<dyn ErrorTranslator>,
}

impl ForwardingEngine {
    /// Engine with the default redirect rewriter and 502 translator.
    pub fn new(origin: Origin, config: &TransportConfig) -> Result<Self, ConfigError> {
        let transport = Transport::new(&origin, config)?;
        let origin = Arc::new(origin);

        Ok(Self {
            director: Director::new(origin.clone()),
            rewriter: Box::new(RedirectRewriter::new(origin.clone())),
            translator: Box::new(BadGatewayTranslator),
            transport,
            origin,
        })
    }

    /// Replace the response rewriting strategy.
    pub fn with_response_rewriter(mut self, rewriter: impl ResponseRewriter + 'static) -> Self {
        self.rewriter = Box::new(rewriter);
        self
    }

    /// Replace the error translation strategy.
    pub fn with_error_translator(mut self, translator: impl ErrorTranslator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Forward one request. Always yields a response.
    pub async fn forward(&self, request: Request<Body>) -> Response<Body> {
        let start_time = Instant::now();
        let summary = RequestSummary {
            request_id: Uuid::new_v4(),
            method: request.method().clone(),
            path: request.uri().path().to_string(),
        };
        let span = tracing::debug_span!(
            "forward",
            request_id = %summary.request_id,
            method = %summary.method,
            path = %summary.path,
        );

        async move {
            match self.try_forward(request).await {
                Ok(response) => {
                    tracing::debug!(status = response.status().as_u16(), "Relaying origin response");
                    metrics::record_request("relayed", start_time);
                    response
                }
                Err(error) => {
                    metrics::record_upstream_error(error.kind());
                    metrics::record_request("errored", start_time);
                    self.translator.translate(&summary, &error)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let outbound = self.director.direct(request)?;
        tracing::debug!(uri = %outbound.uri(), "Dispatching to origin");

        let uri = outbound.uri().clone();
        let response = self.transport.send(outbound).await?;
        Ok(self.rewriter.rewrite(&uri, response)?)
    }
}
