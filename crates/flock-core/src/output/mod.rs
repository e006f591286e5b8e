//! Output
//!
//! Snapshot generation, JSONL writing and run statistics.

pub mod snapshot;
pub mod stats;

pub use snapshot::{
    write_current_state, write_snapshot, SnapshotGenerator, SnapshotWriter, CURRENT_STATE_FILE,
    SNAPSHOTS_FILE,
};
pub use stats::{compute_metrics, RunStats, StatsCollector, STATS_FILE};
