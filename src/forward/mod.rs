//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → director.rs (outbound request aimed at the origin)
//!     → transport (pooled send)
//!         ok  → rewrite.rs (redirect Location back through the gateway)
//!         err → translate.rs (502 "Proxy Error", one error record)
//!     → relayed to the client
//! ```
//!
//! # Design Decisions
//! - One origin per engine, passed in at construction; no global state
//! - The origin descriptor is immutable and shared by `Arc`
//! - Rewriter and translator are strategy objects, replaceable per engine

pub mod director;
pub mod engine;
pub mod origin;
pub mod rewrite;
pub mod translate;

pub use director::Director;
pub use engine::ForwardingEngine;
pub use origin::Origin;
pub use rewrite::{RedirectRewriter, Relocation, ResponseRewriter, RewriteSkipped};
pub use translate::{BadGatewayTranslator, ErrorTranslator, RequestSummary, PROXY_ERROR_BODY};
