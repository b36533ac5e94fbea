//! Snapshot codec.
//!
//! # Format
//! ```json
//! {"version": 2, "last_check_at": "2026-01-01T00:00:00Z",
//!  "cdn_list": [{"host": "...", "request_count": 3, "success_count": 2, "weight": 7450.0}]}
//! ```
//! Entries are written in rank order. Files without a version, or with
//! version 1, predate this format and are discarded whole.
//! `last_check_at` is informational: a naive `YYYY-MM-DD HH:MM:SS[.ffffff]`
//! local time is accepted too, and anything unreadable becomes `None`.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::load_balancer::Registry;

/// Current snapshot format tag.
pub const SNAPSHOT_VERSION: u32 = 2;

/// Version assumed when a file carries none.
const LEGACY_VERSION: u64 = 1;

/// Errors while writing a snapshot. Reading never fails; see [`read_snapshot`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted statistics of one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub host: String,
    pub request_count: u64,
    pub success_count: u64,
    pub weight: f64,
}

/// Point-in-time serialization of the whole pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_check_at: Option<DateTime<Utc>>,
    #[serde(rename = "cdn_list", default)]
    pub entries: Vec<SnapshotEntry>,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = value.as_str().and_then(parse_timestamp);
    if parsed.is_none() && !value.is_null() {
        tracing::debug!(last_check_at = %value, "Unreadable snapshot timestamp ignored");
    }
    Ok(parsed)
}

impl Snapshot {
    /// A current-version snapshot stamped with the current time.
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            last_check_at: Some(Utc::now()),
            entries,
        }
    }

    /// Capture the registry in its current rank order.
    pub fn capture(registry: &Registry) -> Self {
        let entries = registry
            .ranking()
            .into_iter()
            .map(|e| SnapshotEntry {
                host: e.host,
                request_count: e.request_count,
                success_count: e.success_count,
                weight: e.weight,
            })
            .collect();
        Self::new(entries)
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a snapshot. Malformed or outdated content yields `None`.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let value: serde_json::Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::info!(error = %e, "Snapshot is malformed, starting without prior data");
                return None;
            }
        };

        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(LEGACY_VERSION);
        if version <= LEGACY_VERSION {
            tracing::info!(version, "Snapshot version outdated, discarding");
            return None;
        }

        match serde_json::from_value(value) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::info!(error = %e, "Snapshot is malformed, starting without prior data");
                None
            }
        }
    }
}

/// Read a snapshot file. Absent, unreadable, malformed and outdated files all yield `None`.
pub fn read_snapshot(path: &Path) -> Option<Snapshot> {
    match fs::read(path) {
        Ok(bytes) => Snapshot::decode(&bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = ?path, "No snapshot found, starting fresh");
            None
        }
        Err(e) => {
            tracing::info!(path = ?path, error = %e, "Snapshot unreadable, starting fresh");
            None
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a snapshot next to `path` and rename it into place.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;

    tracing::info!(path = ?path, entries = snapshot.entries.len(), "Saved CDN snapshot");
    Ok(())
}
