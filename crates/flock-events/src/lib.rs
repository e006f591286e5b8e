//! Shared snapshot types and serialization for the flocking simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! Renderers and offline tools depend on it without pulling in the ECS.

pub mod snapshot;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export snapshot types
pub use snapshot::{generate_snapshot_id, parse_jsonl, AgentSnapshot, FlockMetrics, FlockSnapshot};
