//! Simulation errors.

use crate::components::AgentId;
use crate::config::ConfigError;

/// Which part of an agent's state went bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    Position,
    Velocity,
}

impl std::fmt::Display for StateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateField::Position => write!(f, "position"),
            StateField::Velocity => write!(f, "velocity"),
        }
    }
}

/// Errors that can occur while building or stepping a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A tick produced NaN or infinity. The store keeps its pre-tick state.
    #[error("non-finite {field} for agent {} at tick {tick}", .agent_id.0)]
    NonFiniteState {
        tick: u64,
        agent_id: AgentId,
        field: StateField,
    },

    /// Two initial states share an id.
    #[error("duplicate agent id {}", .agent_id.0)]
    DuplicateAgentId { agent_id: AgentId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
