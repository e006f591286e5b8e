//! Steering Policy
//!
//! Turns neighbor sums into alignment, cohesion and separation forces, adds
//! the boundary nudge, and blends them into one acceleration.

use glam::Vec3;

use crate::components::AgentState;
use crate::config::{SteeringParams, TURN_FACTOR};

use super::perception::NeighborSums;

/// Return `v` unchanged if `|v| ≤ max`, else `v` rescaled to length `max`.
///
/// The zero vector maps to itself. NaN input is passed through.
#[inline]
pub fn clamp_magnitude(v: Vec3, max: f32) -> Vec3 {
    let length_sq = v.length_squared();
    if length_sq <= max * max {
        v
    } else {
        v * (max / length_sq.sqrt())
    }
}

/// Per-axis push back toward the containment box.
///
/// Fixed magnitude regardless of how far outside the agent is; a coordinate
/// exactly on the bound gets nothing.
pub fn boundary_force(position: Vec3, position_range: f32) -> Vec3 {
    let axis = |coordinate: f32| {
        if coordinate > position_range {
            -TURN_FACTOR
        } else if coordinate < -position_range {
            TURN_FACTOR
        } else {
            0.0
        }
    };

    Vec3::new(axis(position.x), axis(position.y), axis(position.z))
}

/// The four unweighted forces acting on one boid
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringForces {
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub separation: Vec3,
    pub bounds: Vec3,
}

impl SteeringForces {
    /// Derive the forces for `agent` from its neighbor sums.
    pub fn compute(agent: &AgentState, sums: &NeighborSums, params: &SteeringParams) -> Self {
        let bounds = boundary_force(agent.position, params.position_range);

        if sums.is_alone() {
            return Self {
                bounds,
                ..Self::default()
            };
        }

        let n = sums.count as f32;
        Self {
            alignment: clamp_magnitude(sums.alignment / n - agent.velocity, params.max_force),
            cohesion: clamp_magnitude(sums.cohesion / n - agent.position, params.max_force),
            separation: clamp_magnitude(sums.separation / n, params.max_force),
            bounds,
        }
    }

    /// Weighted blend of all four forces.
    pub fn acceleration(&self, params: &SteeringParams) -> Vec3 {
        self.alignment * params.alignment_factor
            + self.cohesion * params.cohesion_factor
            + self.separation * params.separation_factor
            + self.bounds * params.bounds_factor
    }
}

/// Acceleration for `agent` this tick.
pub fn steer(agent: &AgentState, sums: &NeighborSums, params: &SteeringParams) -> Vec3 {
    SteeringForces::compute(agent, sums, params).acceleration(params)
}
