//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Checks produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (status gauges, refresh counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; installing subscribers and exporters
//!   is left to the binary
//! - Metrics are cheap (no-ops until a recorder is installed)

pub mod logging;
pub mod metrics;
