//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     host_list.rs (read pool membership)
//!     → snapshot.rs (read + decode previous snapshot, if any)
//!     → Registry::restore_from (merge counters, full re-sort)
//!
//! Runtime:
//!     snapshotter.rs (ticker, every snapshot_interval_secs)
//!     → Snapshot::capture (consistent copy under the registry lock)
//!     → snapshot.rs (write temp file, rename)
//! ```
//!
//! # Design Decisions
//! - Best-effort: a missed or failed save is logged, never fatal
//! - Absent, corrupt or outdated snapshots mean "no prior data"
//! - Snapshots never add hosts; the host list is the only membership source

pub mod host_list;
pub mod snapshot;
pub mod snapshotter;

pub use host_list::{load_host_list, HostListError};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotEntry, SnapshotError};
pub use snapshotter::Snapshotter;
