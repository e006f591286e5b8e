//! Flocking simulation core: boids, steering rules, two-phase tick.

pub mod components;
pub mod config;
pub mod error;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::{AgentId, AgentState};
pub use config::{
    default_config_toml, ConfigError, FlockConfig, NeighborSearch, RuntimeConfig, SteeringParams,
    TURN_FACTOR,
};
pub use error::{SimError, StateField};
pub use simulation::Simulation;
