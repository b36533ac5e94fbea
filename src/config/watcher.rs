//! Configuration file watcher.
//!
//! # Responsibilities
//! - Notice edits to the config file, including editors that save by writing a
//!   temp file and renaming it over the original
//! - Reload and validate on every change
//! - Forward a config only when it differs from the last one forwarded
//!
//! The parent directory is watched rather than the file itself: a rename-replace
//! swaps the inode, and a watch on the old inode goes silent.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use crate::config::loader::load_config;
use crate::config::schema::RankerConfig;

/// Reload state: the file to read and the config last handed out.
struct ReloadTracker {
    path: PathBuf,
    last: RankerConfig,
}

impl ReloadTracker {
    /// Re-read the file. Returns the new config if it parsed, validated and changed.
    fn reload(&mut self) -> Option<RankerConfig> {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Config reload rejected, keeping current configuration");
                return None;
            }
        };

        if config == self.last {
            tracing::debug!(path = ?self.path, "Config file touched without changes");
            return None;
        }

        if config.cdn.enabled != self.last.cdn.enabled {
            tracing::info!(enabled = config.cdn.enabled, "CDN selection toggled in config");
        } else {
            tracing::info!(path = ?self.path, "Config changed");
        }
        self.last = config.clone();
        Some(config)
    }
}

/// Watches the config file and streams changed configurations.
pub struct ConfigWatcher {
    tracker: ReloadTracker,
    update_tx: mpsc::UnboundedSender<RankerConfig>,
}

impl ConfigWatcher {
    /// `current` is the config already in effect; reloads equal to it are not forwarded.
    pub fn new(path: &Path, current: RankerConfig) -> (Self, mpsc::UnboundedReceiver<RankerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let tracker = ReloadTracker {
            path: path.to_path_buf(),
            last: current,
        };
        (Self { tracker, update_tx }, update_rx)
    }

    fn watch_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { mut tracker, update_tx } = self;
        let dir = Self::watch_dir(&tracker.path);
        let file_name: Option<OsString> = tracker.path.file_name().map(|n| n.to_os_string());
        let path = tracker.path.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if !ours {
                        return;
                    }
                    if let Some(config) = tracker.reload() {
                        let _ = update_tx.send(config);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}
