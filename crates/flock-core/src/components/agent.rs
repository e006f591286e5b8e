//! Agent Components
//!
//! Components for individual boids: identity, position, velocity.

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use flock_events::AgentSnapshot;

/// Marker component identifying an entity as a boid
#[derive(Component, Debug, Clone, Default)]
pub struct Boid;

/// Stable identifier for a boid, assigned at spawn
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// Component: a boid's location in world space
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec3);

/// Component: a boid's displacement per tick
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

/// Plain copy of one boid's state, detached from the ECS world.
///
/// This is what the store hands out to readers and what callers pass in to
/// seed a flock with explicit positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl AgentState {
    pub fn new(id: u32, position: Vec3, velocity: Vec3) -> Self {
        Self {
            id: AgentId(id),
            position,
            velocity,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// True when both vectors hold only finite components.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    pub fn to_snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::new(self.id.0, self.position.to_array(), self.velocity.to_array())
    }
}

/// Component bundle for spawning a boid
#[derive(Bundle)]
pub struct BoidBundle {
    pub boid: Boid,
    pub id: AgentId,
    pub position: Position,
    pub velocity: Velocity,
}

impl From<AgentState> for BoidBundle {
    fn from(state: AgentState) -> Self {
        Self {
            boid: Boid,
            id: state.id,
            position: Position(state.position),
            velocity: Velocity(state.velocity),
        }
    }
}
