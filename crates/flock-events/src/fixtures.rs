//! Sample data fixtures for testing.
//!
//! This module provides ready-made snapshots for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // flock-events = { path = "../flock-events", features = ["test-fixtures"] }
//!
//! use flock_events::fixtures;
//!
//! let snapshots = fixtures::sample_snapshots();
//! ```

use crate::FlockSnapshot;

/// Returns sample snapshots from the fixtures file.
///
/// Contains two consecutive ticks of a three-boid flock:
/// - agents 0 and 1 are each other's only neighbor
/// - agent 2 starts outside the containment box and is nudged back
pub fn sample_snapshots() -> Vec<FlockSnapshot> {
    let jsonl = include_str!("../tests/fixtures/sample_snapshots.jsonl");
    crate::snapshot::parse_jsonl(jsonl)
        .unwrap_or_else(|e| panic!("Failed to parse sample_snapshots.jsonl: {}", e))
}

/// Returns the snapshot taken after the first tick.
pub fn first_tick_snapshot() -> FlockSnapshot {
    sample_snapshots()
        .into_iter()
        .find(|s| s.tick == 1)
        .expect("Tick 1 snapshot should exist in fixtures")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_snapshots_load() {
        let snapshots = sample_snapshots();
        assert_eq!(snapshots.len(), 2, "Should have 2 sample snapshots");
        assert!(snapshots.iter().all(|s| s.agent_count() == 3));
    }

    #[test]
    fn test_first_tick_snapshot() {
        let snapshot = first_tick_snapshot();

        let stray = snapshot.find_agent(2).unwrap();
        assert_eq!(stray.velocity, [-0.2, 0.0, 0.0]);
        assert_eq!(snapshot.metrics.outside_bounds, 1);
    }
}
