//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, protocol detection)
//!     → forwarding engine
//!     → Send to client
//! ```

pub mod headers;
pub mod server;

pub use headers::{X_FORWARDED_HOST, X_ORIGIN_HOST};
pub use server::GatewayServer;
