//! CDN selection service.
//!
//! # Responsibilities
//! - `start`: load the host list, restore the last snapshot, spawn the snapshotter
//! - `stop`: halt the snapshotter and drop all in-memory statistics
//! - `apply_config`: follow the `cdn.enabled` toggle on config reload; other
//!   settings take effect on the next start
//! - Route `select` / `report_result` to the live registry
//!
//! # Design Decisions
//! - The live registry sits behind an `ArcSwapOption`; `select` and `report_result`
//!   never take the lifecycle lock
//! - A fresh registry is built on every start; nothing survives a stop except
//!   what was written to the snapshot

use std::sync::Arc;
use arc_swap::{ArcSwap, ArcSwapOption};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use crate::config::RankerConfig;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{RankedEndpoint, Registry, RegistryError};
use crate::persistence::{load_host_list, read_snapshot, HostListError, Snapshotter};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The feature is disabled or not started; callers fall back to direct requests.
    #[error("CDN selection is not running")]
    NotRunning,

    #[error(transparent)]
    HostList(#[from] HostListError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

struct Running {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

pub struct CdnService {
    config: ArcSwap<RankerConfig>,
    registry: ArcSwapOption<Registry>,
    running: Mutex<Option<Running>>,
}

impl CdnService {
    pub fn new(config: RankerConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            registry: ArcSwapOption::empty(),
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> Arc<RankerConfig> {
        self.config.load_full()
    }

    pub fn is_running(&self) -> bool {
        self.registry.load().is_some()
    }

    /// Handle to the live registry, if running.
    pub fn registry(&self) -> Option<Arc<Registry>> {
        self.registry.load_full()
    }

    /// Build the pool and begin periodic snapshotting.
    ///
    /// No-op when already running or when `cdn.enabled` is false.
    pub async fn start(&self) -> Result<(), ServiceError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("CDN selection already running");
            return Ok(());
        }

        let config = self.config.load_full();
        if !config.cdn.enabled {
            tracing::info!("CDN selection disabled");
            return Ok(());
        }

        let hosts = load_host_list(&config.cdn.host_list_path)?;
        tracing::info!(
            hosts = hosts.len(),
            path = ?config.cdn.host_list_path,
            "Loaded CDN host list"
        );

        let registry = Arc::new(Registry::from_config(hosts, &config));
        if let Some(snapshot) = read_snapshot(&config.cdn.snapshot_path) {
            let applied = registry.restore_from(&snapshot);
            tracing::info!(
                applied,
                last_check_at = ?snapshot.last_check_at,
                "Restored CDN statistics"
            );
        }

        let shutdown = Shutdown::new();
        let snapshotter = Snapshotter::new(
            registry.clone(),
            config.cdn.snapshot_path.clone(),
            config.cdn.snapshot_interval(),
        )
        .with_flush_on_shutdown(config.cdn.flush_on_shutdown);
        let task = tokio::spawn(snapshotter.run(shutdown.subscribe()));

        self.registry.store(Some(registry));
        *running = Some(Running { shutdown, task });

        tracing::info!("CDN selection started");
        Ok(())
    }

    /// Stop snapshotting and drop the pool. Waits for the snapshotter to exit.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(Running { shutdown, task }) = running.take() else {
            tracing::debug!("CDN selection not running");
            return;
        };

        self.registry.store(None);
        if !shutdown.trigger() {
            tracing::debug!("Snapshotter already gone");
        }
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Snapshotter task failed");
        }

        tracing::info!("CDN selection stopped");
    }

    /// Replace the configuration and start or stop to match `cdn.enabled`.
    ///
    /// While running, other changes are stored but only read by the next `start`.
    pub async fn apply_config(&self, config: RankerConfig) -> Result<(), ServiceError> {
        let enabled = config.cdn.enabled;
        let previous = self.config.swap(Arc::new(config.clone()));

        match (enabled, self.is_running()) {
            (true, false) => self.start().await,
            (false, true) => {
                self.stop().await;
                Ok(())
            }
            (true, true) => {
                let deferred = deferred_changes(&previous, &config);
                if !deferred.is_empty() {
                    tracing::info!(
                        changed = ?deferred,
                        "CDN settings changed while running, they take effect on restart"
                    );
                }
                Ok(())
            }
            (false, false) => Ok(()),
        }
    }

    pub fn select(&self) -> Result<String, ServiceError> {
        let registry = self.registry.load_full().ok_or(ServiceError::NotRunning)?;
        Ok(registry.select()?)
    }

    pub fn report_result(&self, host: &str, delay_ms: u64, success: bool) -> Result<(), ServiceError> {
        let registry = self.registry.load_full().ok_or(ServiceError::NotRunning)?;
        Ok(registry.report_result(host, delay_ms, success)?)
    }

    /// Current ranking, empty when not running.
    pub fn ranking(&self) -> Vec<RankedEndpoint> {
        self.registry
            .load_full()
            .map(|registry| registry.ranking())
            .unwrap_or_default()
    }
}

/// Settings read only at `start` that differ between two configs.
fn deferred_changes(previous: &RankerConfig, next: &RankerConfig) -> Vec<&'static str> {
    let (a, b) = (&previous.cdn, &next.cdn);
    let mut changed = Vec::new();
    if a.host_list_path != b.host_list_path {
        changed.push("cdn.host_list_path");
    }
    if a.snapshot_path != b.snapshot_path {
        changed.push("cdn.snapshot_path");
    }
    if a.snapshot_interval_secs != b.snapshot_interval_secs {
        changed.push("cdn.snapshot_interval_secs");
    }
    if a.flush_on_shutdown != b.flush_on_shutdown {
        changed.push("cdn.flush_on_shutdown");
    }
    if a.top_k != b.top_k {
        changed.push("cdn.top_k");
    }
    if previous.scoring != next.scoring {
        changed.push("scoring");
    }
    changed
}
