//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request outcome reported (host, delay, success)
//!     → registry.rs (look up endpoint by host)
//!     → endpoint.rs (update counters, recompute weight)
//!     → registry.rs (reposition endpoint in ranked sequence)
//!
//! Selection
//!     → registry.rs (lock, read ranked length)
//!     → top_slice.rs (random index in top K)
//!     → host string
//! ```
//!
//! # Design Decisions
//! - One mutex guards the whole ranked pool; reports and selections serialize
//! - Reordering is incremental (adjacent swaps), full sort only on restore
//! - Selection never pins to rank 0 so traffic spreads over the best hosts

pub mod endpoint;
pub mod registry;
pub mod top_slice;

use thiserror::Error;

pub use endpoint::{EndpointScore, HealthSample};
pub use registry::{RankedEndpoint, Registry};
pub use top_slice::TopSlice;

/// Strategy for choosing a rank from a ranked pool.
pub trait Selector: Send + Sync + std::fmt::Debug {
    /// Return an index into a ranked sequence of `ranked_len` endpoints.
    fn pick(&self, ranked_len: usize) -> Option<usize>;
}

/// Errors produced by registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A result was reported for a host outside the pool.
    #[error("host not tracked: {0}")]
    HostNotTracked(String),

    /// The pool has no endpoints to select from.
    #[error("no endpoints configured")]
    NoEndpoints,
}
