//! CDN endpoint ranking and selection.
//!
//! Tracks success rate and latency per CDN host, keeps the pool ranked by a
//! derived weight, persists the statistics across restarts and hands out hosts
//! drawn at random from the top of the ranking.

pub mod config;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod persistence;

pub use config::schema::RankerConfig;
pub use lifecycle::{CdnService, ServiceError};
pub use load_balancer::{Registry, RegistryError};
