//! Snapshot Types
//!
//! Serialization structs for flock snapshots.
//!
//! A snapshot captures every boid's position and velocity after a tick. The
//! rendering layer reads these once per frame; offline tools read them back
//! from the JSONL output of the driver.

use serde::{Deserialize, Serialize};

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// One boid's state at the end of a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: u32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
}

impl AgentSnapshot {
    pub fn new(agent_id: u32, position: [f32; 3], velocity: [f32; 3]) -> Self {
        Self {
            agent_id,
            position,
            velocity,
        }
    }

    /// Magnitude of the velocity vector.
    pub fn speed(&self) -> f32 {
        let [x, y, z] = self.velocity;
        (x * x + y * y + z * z).sqrt()
    }
}

/// Aggregate measures over the whole flock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlockMetrics {
    pub centroid: [f32; 3],
    pub mean_speed: f32,
    pub max_speed: f32,
    /// Average neighbor count seen by the last Phase A
    pub mean_neighbors: f32,
    /// Agents with any coordinate beyond the containment box
    #[serde(default)]
    pub outside_bounds: u32,
}

/// Complete flock snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlockSnapshot {
    pub snapshot_id: String,
    pub tick: u64,
    pub triggered_by: String,
    pub agents: Vec<AgentSnapshot>,
    #[serde(default)]
    pub metrics: FlockMetrics,
}

impl FlockSnapshot {
    /// Creates an empty snapshot for the given tick.
    pub fn new(snapshot_id: impl Into<String>, tick: u64, triggered_by: impl Into<String>) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            tick,
            triggered_by: triggered_by.into(),
            agents: Vec::new(),
            metrics: FlockMetrics::default(),
        }
    }

    /// Finds an agent by ID.
    pub fn find_agent(&self, agent_id: u32) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the snapshot to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a snapshot from JSON (pretty or single-line).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Parses every non-blank line of a JSONL stream into snapshots.
pub fn parse_jsonl(content: &str) -> Result<Vec<FlockSnapshot>, serde_json::Error> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(FlockSnapshot::from_json)
        .collect()
}
