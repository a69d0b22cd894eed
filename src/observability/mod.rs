//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Task engine and request boundary produce:
//!     → tracing.rs (one span per task invocation, exported on close)
//!     → metrics.rs (request counter, pull gauges, latency histogram)
//!     → logging.rs (structured events, burst-sampled per key)
//!
//! Consumers:
//!     → Log aggregation (stdout via tracing-subscriber)
//!     → Metrics endpoint (Prometheus scrape, which pulls the gauges)
//!     → Span exporter (structured-log exporter, swappable for tests)
//! ```
//!
//! # Design Decisions
//! - Instruments and emitters are explicit objects built at startup and
//!   passed by reference; tests inject fakes
//! - Telemetry failure never reaches the computation: increments no-op
//!   without a recorder, export errors are logged and dropped

pub mod logging;
pub mod metrics;
pub mod tracing;
