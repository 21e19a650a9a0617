//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! forwarding engine, transport, rewriter
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every forwarded request runs in a span carrying a generated request id
//! - Exactly one error record per forwarding failure, from the error translator

pub mod logging;
pub mod metrics;
