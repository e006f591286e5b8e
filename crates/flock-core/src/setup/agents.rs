//! Agent Spawning
//!
//! Creates the initial population with randomized positions and velocities.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::components::{AgentId, AgentState, Boid, BoidBundle, Velocity};
use crate::config::SteeringParams;
use crate::systems::steering::clamp_magnitude;

/// Generate the initial state for boid `index`.
///
/// Position is uniform in a cube of side `position_range` centred at the
/// origin. Velocity is uniform per axis in `[-1, 1)` scaled by `max_speed`,
/// then capped to `max_speed` so the speed bound holds from tick zero.
pub fn generate_agent_state(index: u32, params: &SteeringParams, rng: &mut SmallRng) -> AgentState {
    let half = params.position_range / 2.0;
    let position = Vec3::new(
        rng.gen_range(-half..half),
        rng.gen_range(-half..half),
        rng.gen_range(-half..half),
    );

    let direction = Vec3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    let velocity = clamp_magnitude(direction * params.max_speed, params.max_speed);

    AgentState::new(index, position, velocity)
}

/// Spawn boids with the given states, in order
pub fn spawn_agents(world: &mut World, states: &[AgentState]) -> Vec<Entity> {
    states
        .iter()
        .map(|state| world.spawn(BoidBundle::from(*state)).id())
        .collect()
}

/// Spawn `population` boids with ids `0..population`
pub fn spawn_flock(
    world: &mut World,
    population: usize,
    params: &SteeringParams,
    rng: &mut SmallRng,
) -> Vec<Entity> {
    let states: Vec<AgentState> = (0..population as u32)
        .map(|index| generate_agent_state(index, params, rng))
        .collect();

    spawn_agents(world, &states)
}

/// Get summary stats for spawned boids
pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let mut query = world.query_filtered::<(&AgentId, &Velocity), With<Boid>>();

    let mut total_agents = 0u32;
    let mut total_speed = 0.0f32;
    let mut max_speed = 0.0f32;
    for (_id, velocity) in query.iter(world) {
        let speed = velocity.0.length();
        total_agents += 1;
        total_speed += speed;
        max_speed = max_speed.max(speed);
    }

    SpawnSummary {
        total_agents,
        mean_speed: if total_agents > 0 {
            total_speed / total_agents as f32
        } else {
            0.0
        },
        max_speed,
    }
}

/// Summary of spawned boids
#[derive(Debug)]
pub struct SpawnSummary {
    pub total_agents: u32,
    pub mean_speed: f32,
    pub max_speed: f32,
}

impl std::fmt::Display for SpawnSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} agents, mean speed {:.4}, max speed {:.4}",
            self.total_agents, self.mean_speed, self.max_speed
        )
    }
}
