//! Snapshot Output
//!
//! Periodic snapshot scheduling and append-only JSONL snapshot logging.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use flock_events::{generate_snapshot_id, FlockSnapshot};

/// File name of the JSONL snapshot log inside the output directory
pub const SNAPSHOTS_FILE: &str = "snapshots.jsonl";

/// File name of the latest-state file inside the output directory
pub const CURRENT_STATE_FILE: &str = "current_state.json";

/// Decides which ticks get a snapshot and hands out snapshot IDs
#[derive(Debug)]
pub struct SnapshotGenerator {
    next_snapshot_id: u64,
    snapshot_interval: u64,
    last_snapshot_tick: Option<u64>,
}

impl SnapshotGenerator {
    /// An interval of zero disables periodic snapshots.
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            next_snapshot_id: 0,
            snapshot_interval,
            last_snapshot_tick: None,
        }
    }

    pub fn should_snapshot(&self, current_tick: u64) -> bool {
        if self.last_snapshot_tick == Some(current_tick) {
            return false;
        }
        self.snapshot_interval > 0 && current_tick % self.snapshot_interval == 0
    }

    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        id
    }

    pub fn mark_snapshot(&mut self, tick: u64) {
        self.last_snapshot_tick = Some(tick);
    }

    pub fn last_snapshot_tick(&self) -> Option<u64> {
        self.last_snapshot_tick
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_snapshot_id
    }
}

/// Appends snapshots to a JSONL file, one per line
pub struct SnapshotWriter {
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl SnapshotWriter {
    /// Create a writer truncating the file at `path`
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    /// Create a writer that discards snapshots (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write(&mut self, snapshot: &FlockSnapshot) -> std::io::Result<()> {
        self.written += 1;
        if let Some(ref mut writer) = self.writer {
            let json = snapshot.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush snapshot writer: {}", e);
        }
    }
}

/// Write a snapshot as pretty JSON
pub fn write_snapshot(snapshot: &FlockSnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = snapshot.to_json_pretty()?;
    fs::write(path, json)
}

/// Write current state into `output_dir` (overwrites each time)
pub fn write_current_state(snapshot: &FlockSnapshot, output_dir: impl AsRef<Path>) -> std::io::Result<()> {
    write_snapshot(snapshot, output_dir.as_ref().join(CURRENT_STATE_FILE))
}
