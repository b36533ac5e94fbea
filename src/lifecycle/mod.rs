//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (service.rs):
//!     Read host list → Build registry → Restore snapshot → Spawn snapshotter
//!
//! Stop (service.rs + shutdown.rs):
//!     Detach registry → Signal snapshotter → Optional final flush → Join task
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller runs stop
//! ```
//!
//! # Design Decisions
//! - Explicit start/stop on an owned service, no global instance
//! - Stop is deterministic: the snapshotter task is joined, not abandoned

pub mod service;
pub mod shutdown;
pub mod signals;

pub use service::{CdnService, ServiceError};
pub use shutdown::Shutdown;
