//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the ranker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the CDN ranker.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RankerConfig {
    /// Pool, snapshot and selection settings.
    pub cdn: CdnConfig,

    /// Weight formula constants.
    pub scoring: ScoringConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// CDN pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CdnConfig {
    /// Master toggle for CDN-based selection.
    pub enabled: bool,

    /// File listing one host per line.
    pub host_list_path: PathBuf,

    /// Where the periodic snapshot is written and restored from.
    pub snapshot_path: PathBuf,

    /// Period between snapshots in seconds.
    pub snapshot_interval_secs: u64,

    /// Write one last snapshot when the feature is stopped.
    pub flush_on_shutdown: bool,

    /// Size of the ranked slice that `select` draws from.
    pub top_k: usize,
}

impl CdnConfig {
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host_list_path: PathBuf::from("data/cdn.txt"),
            snapshot_path: PathBuf::from("runtime/cdn_snapshot.json"),
            snapshot_interval_secs: 600,
            flush_on_shutdown: true,
            top_k: 100,
        }
    }
}

/// Constants of the endpoint weight formula.
///
/// `weight = success_rate * success_rate_weight + delay_score * avg_delay_weight`
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Multiplier for the success rate term. Must exceed `avg_delay_weight`.
    pub success_rate_weight: f64,

    /// Multiplier for the delay score term.
    pub avg_delay_weight: f64,

    /// Average delay (ms) at or above which the delay score is zero.
    pub base_delay_ms: f64,

    /// Number of recent successful delays kept per endpoint.
    pub delay_window: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            success_rate_weight: 10_000.0,
            avg_delay_weight: 1_000.0,
            base_delay_ms: 1_000.0,
            delay_window: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
