//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, snapshotter and service produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (no-ops until an exporter is installed)
//! - Untracked-host reports are warnings, lifecycle and snapshots are info

pub mod logging;
pub mod metrics;
