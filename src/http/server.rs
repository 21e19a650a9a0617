//! HTTP server setup.
//!
//! # Responsibilities
//! - Create Axum Router dispatching every method and path to the engine
//! - Serve HTTP/1.1 and HTTP/2 (h2c) on the bound listener
//! - Wire up request tracing
//! - Stop accepting on the shutdown signal and drain in-flight requests

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::forward::ForwardingEngine;

/// HTTP front end of the gateway.
pub struct GatewayServer {
    router: Router,
    engine: Arc<ForwardingEngine>,
}

impl GatewayServer {
    pub fn new(engine: ForwardingEngine) -> Self {
        let engine = Arc::new(engine);
        let router = Self::build_router(engine.clone());
        Self { router, engine }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(engine: Arc<ForwardingEngine>) -> Router {
        Router::new()
            .route("/", any(forward_handler))
            .route("/{*path}", any(forward_handler))
            .with_state(engine)
            // Forwarding failures are already logged once by the error translator.
            .layer(TraceLayer::new_for_http().on_failure(()))
    }

    /// The router, for embedding or driving with `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            origin = %self.engine.origin(),
            "Gateway listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn forward_handler(
    State(engine): State<Arc<ForwardingEngine>>,
    request: Request,
) -> Response<Body> {
    engine.forward(request).await
}
