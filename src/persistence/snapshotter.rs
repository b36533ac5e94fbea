//! Periodic snapshotting.
//!
//! # Responsibilities
//! - Capture the registry on a fixed period
//! - Write the snapshot off the async worker threads
//! - Exit promptly on the shutdown signal

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use crate::load_balancer::Registry;
use crate::observability::metrics;
use crate::persistence::snapshot::{write_snapshot, Snapshot, SnapshotError};

pub struct Snapshotter {
    registry: Arc<Registry>,
    path: PathBuf,
    period: Duration,
    flush_on_shutdown: bool,
}

impl Snapshotter {
    pub fn new(registry: Arc<Registry>, path: PathBuf, period: Duration) -> Self {
        Self {
            registry,
            path,
            period,
            flush_on_shutdown: false,
        }
    }

    /// Write one last snapshot when the shutdown signal arrives.
    pub fn with_flush_on_shutdown(mut self, flush: bool) -> Self {
        self.flush_on_shutdown = flush;
        self
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            period_secs = self.period.as_secs(),
            path = ?self.path,
            "Snapshotter starting"
        );

        // First save happens one full period after start; missed ticks are not replayed.
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.save().await {
                        tracing::error!(path = ?self.path, error = %e, "Failed to save CDN snapshot");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Snapshotter received shutdown signal, exiting loop");
                    if self.flush_on_shutdown {
                        if let Err(e) = self.save().await {
                            tracing::error!(path = ?self.path, error = %e, "Failed to flush CDN snapshot");
                        }
                    }
                    break;
                }
            }
        }
    }

    /// Capture and write the registry now. Returns the number of entries written.
    pub async fn save(&self) -> Result<usize, SnapshotError> {
        let snapshot = Snapshot::capture(&self.registry);
        let entries = snapshot.entries.len();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_snapshot(&path, &snapshot))
            .await
            .map_err(|e| SnapshotError::Io(std::io::Error::other(e)))??;

        metrics::record_snapshot_saved(entries);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::lifecycle::Shutdown;
    use crate::load_balancer::TopSlice;
    use crate::persistence::snapshot::read_snapshot;

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::new(["a", "b"], ScoringConfig::default(), TopSlice::default()))
    }

    #[tokio::test]
    async fn test_periodic_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let registry = registry();
        registry.report_result("b", 120, true).unwrap();

        let shutdown = Shutdown::new();
        let snapshotter = Snapshotter::new(registry, path.clone(), Duration::from_millis(50));
        let handle = tokio::spawn(snapshotter.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(300)).await;
        let snapshot = read_snapshot(&path).expect("snapshot written");
        assert_eq!(snapshot.entries[0].host, "b");

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_flush_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let shutdown = Shutdown::new();
        let snapshotter = Snapshotter::new(registry(), path.clone(), Duration::from_secs(600))
            .with_flush_on_shutdown(true);
        let handle = tokio::spawn(snapshotter.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!path.exists());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert_eq!(read_snapshot(&path).unwrap().entries.len(), 2);
    }

    #[tokio::test]
    async fn test_no_flush_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let shutdown = Shutdown::new();
        let snapshotter = Snapshotter::new(registry(), path.clone(), Duration::from_secs(600));
        let handle = tokio::spawn(snapshotter.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
        assert!(!path.exists());
    }
}
