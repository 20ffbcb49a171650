//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway, config reload, comment store:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Request IDs come from the HTTP layer and show up in every span
//! - Metrics are cheap (atomic increments) and safe to record before
//!   an exporter is installed

pub mod logging;
pub mod metrics;
