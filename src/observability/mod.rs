//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator:
//!     → logging.rs (Logger bound to {listener: address}, lifecycle transitions)
//!     → metrics.rs (termination and run outcome counters)
//!
//! Prober:
//!     → metrics.rs (attempt counters; probes never log)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (no-ops until an exporter is installed)

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, Logger, LoggingError};
