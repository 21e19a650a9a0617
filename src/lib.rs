//! Single-origin reverse forwarding gateway library.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod transport;

pub use config::schema::GatewayConfig;
pub use forward::{ForwardingEngine, Origin};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
