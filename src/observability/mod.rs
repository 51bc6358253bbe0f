//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! engine + topology manager produce:
//!     → structured log events (tracing)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → whatever subscriber/exporter the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a tracing subscriber or metrics exporter
//! - Metric updates are cheap (atomic increments behind the facade)

pub mod metrics;
