//! Integrator
//!
//! A tick runs in two phases. Phase A reads the store into a frame and
//! computes every boid's acceleration from that frame alone, buffering the
//! results in [`PendingSteering`]. Phase B applies the buffer. No boid ever
//! sees a neighbor's already-updated state within the same tick, so the
//! result does not depend on storage order.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rayon::prelude::*;

use crate::components::{AgentId, AgentState, Boid, Position, Velocity};
use crate::config::{FlockConfig, SteeringParams};
use crate::error::StateField;

use super::perception::{NeighborIndex, NeighborSums};
use super::steering::{clamp_magnitude, steer};

/// One buffered Phase A result
#[derive(Debug, Clone, Copy)]
pub struct PendingForce {
    pub entity: Entity,
    pub id: AgentId,
    pub acceleration: Vec3,
    pub neighbor_count: u32,
}

/// Resource: accelerations computed by Phase A, consumed by Phase B
#[derive(Resource, Debug, Default)]
pub struct PendingSteering {
    forces: Vec<PendingForce>,
}

impl PendingSteering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, force: PendingForce) {
        self.forces.push(force);
    }

    pub fn drain(&mut self) -> Vec<PendingForce> {
        std::mem::take(&mut self.forces)
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }
}

/// A non-finite value Phase B refused to commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateViolation {
    pub agent_id: AgentId,
    pub field: StateField,
}

/// Resource: outcome of the most recent tick
#[derive(Resource, Debug, Default)]
pub struct TickReport {
    /// Whether Phase B wrote the new states
    pub committed: bool,
    pub violations: Vec<StateViolation>,
    /// Per-agent neighbor counts behind the last committed tick, in id order
    pub neighbor_counts: Vec<u32>,
}

impl TickReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean_neighbors(&self) -> f32 {
        if self.neighbor_counts.is_empty() {
            return 0.0;
        }
        let total: u64 = self.neighbor_counts.iter().map(|&c| c as u64).sum();
        total as f32 / self.neighbor_counts.len() as f32
    }
}

/// Acceleration for every agent of `frame`, in frame order.
///
/// Pure over the frame: the parallel and serial paths produce identical
/// results.
pub fn compute_accelerations(
    frame: &[AgentState],
    index: &NeighborIndex,
    params: &SteeringParams,
    parallel: bool,
) -> Vec<(Vec3, NeighborSums)> {
    let per_agent = |subject: usize| {
        let sums = index.evaluate(subject, frame, params.perception_radius);
        (steer(&frame[subject], &sums, params), sums)
    };

    if parallel {
        (0..frame.len()).into_par_iter().map(per_agent).collect()
    } else {
        (0..frame.len()).map(per_agent).collect()
    }
}

/// Advance one agent by its acceleration.
#[inline]
pub fn integrate(state: &AgentState, acceleration: Vec3, max_speed: f32) -> AgentState {
    let velocity = clamp_magnitude(state.velocity + acceleration, max_speed);
    AgentState {
        id: state.id,
        position: state.position + velocity,
        velocity,
    }
}

/// Phase A: snapshot the store and buffer every boid's acceleration
pub fn compute_steering(
    config: Res<FlockConfig>,
    mut pending: ResMut<PendingSteering>,
    query: Query<(Entity, &AgentId, &Position, &Velocity), With<Boid>>,
) {
    let mut rows: Vec<(Entity, AgentState)> = query
        .iter()
        .map(|(entity, id, position, velocity)| {
            let state = AgentState {
                id: *id,
                position: position.0,
                velocity: velocity.0,
            };
            (entity, state)
        })
        .collect();
    // Frame order is id order, so neighbor sums accumulate identically
    // whatever order the world stores boids in
    rows.sort_by_key(|(_, state)| state.id);
    let (entities, frame): (Vec<Entity>, Vec<AgentState>) = rows.into_iter().unzip();

    let params = &config.steering;
    let index = NeighborIndex::build(config.runtime.neighbor_search, &frame, params.perception_radius);
    let results = compute_accelerations(&frame, &index, params, config.runtime.parallel);

    pending.forces.clear();
    for ((entity, agent), (acceleration, sums)) in entities.into_iter().zip(&frame).zip(results) {
        pending.push(PendingForce {
            entity,
            id: agent.id,
            acceleration,
            neighbor_count: sums.count,
        });
    }
}

/// Phase B: apply buffered accelerations to every boid at once
///
/// New states are computed in full and checked before anything is written.
/// If any value is non-finite nothing is committed and the offending agents
/// are recorded in the [`TickReport`].
pub fn apply_steering(
    config: Res<FlockConfig>,
    mut pending: ResMut<PendingSteering>,
    mut report: ResMut<TickReport>,
    mut query: Query<(&AgentId, &mut Position, &mut Velocity), With<Boid>>,
) {
    let forces = pending.drain();
    let max_speed = config.steering.max_speed;

    report.committed = false;
    report.violations.clear();

    let mut updates = Vec::with_capacity(forces.len());
    for force in &forces {
        let Ok((id, position, velocity)) = query.get(force.entity) else {
            continue;
        };
        let current = AgentState {
            id: *id,
            position: position.0,
            velocity: velocity.0,
        };
        let next = integrate(&current, force.acceleration, max_speed);

        if !next.velocity.is_finite() {
            report.violations.push(StateViolation {
                agent_id: next.id,
                field: StateField::Velocity,
            });
        } else if !next.position.is_finite() {
            report.violations.push(StateViolation {
                agent_id: next.id,
                field: StateField::Position,
            });
        }
        updates.push((force.entity, next));
    }

    if !report.violations.is_empty() {
        for violation in &report.violations {
            tracing::error!(
                agent = violation.agent_id.0,
                field = %violation.field,
                "non-finite state, tick not committed"
            );
        }
        return;
    }

    for (entity, next) in updates {
        if let Ok((_, mut position, mut velocity)) = query.get_mut(entity) {
            position.0 = next.position;
            velocity.0 = next.velocity;
        }
    }
    report.neighbor_counts = forces.iter().map(|f| f.neighbor_count).collect();
    report.committed = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NeighborSearch;

    fn two_agent_frame() -> Vec<AgentState> {
        vec![
            AgentState::new(0, Vec3::ZERO, Vec3::ZERO),
            AgentState::new(1, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
        ]
    }

    fn loose_params() -> SteeringParams {
        SteeringParams {
            perception_radius: 7.0,
            max_speed: 10.0,
            max_force: 10.0,
            ..SteeringParams::default()
        }
    }

    #[test]
    fn test_integrate_clamps_speed() {
        let state = AgentState::new(0, Vec3::ZERO, Vec3::new(0.3, 0.0, 0.0));
        let next = integrate(&state, Vec3::new(0.0, 0.0, 0.4), 0.25);

        assert!((next.velocity.length() - 0.25).abs() < 1e-6);
        assert_eq!(next.position, next.velocity);
    }

    #[test]
    fn test_integrate_below_cap_is_exact() {
        let state = AgentState::new(0, Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.5, 0.0, 0.0));
        let next = integrate(&state, Vec3::new(0.0, 0.25, 0.0), 1.0);

        assert_eq!(next.velocity, Vec3::new(0.5, 0.25, 0.0));
        assert_eq!(next.position, Vec3::new(1.5, 1.25, 1.0));
    }

    #[test]
    fn test_compute_accelerations_two_agents() {
        let frame = two_agent_frame();
        let params = loose_params();
        let index = NeighborIndex::build(NeighborSearch::AllPairs, &frame, params.perception_radius);

        let results = compute_accelerations(&frame, &index, &params, false);
        assert_eq!(results[0].0, Vec3::new(-0.5, 1.0, 0.0));
        assert_eq!(results[1].0, Vec3::new(0.5, -1.0, 0.0));
        assert_eq!(results[0].1.count, 1);
        assert_eq!(results[1].1.count, 1);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let frame: Vec<AgentState> = (0..64)
            .map(|i| {
                let t = i as f32;
                AgentState::new(
                    i,
                    Vec3::new((t * 0.7).sin() * 6.0, (t * 1.3).cos() * 6.0, t * 0.1 - 3.0),
                    Vec3::new((t * 0.2).cos(), (t * 0.5).sin(), 0.1) * 0.3,
                )
            })
            .collect();
        let params = SteeringParams::default();
        let index = NeighborIndex::build(NeighborSearch::AllPairs, &frame, params.perception_radius);

        let serial = compute_accelerations(&frame, &index, &params, false);
        let parallel = compute_accelerations(&frame, &index, &params, true);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_mean_neighbors() {
        let report = TickReport {
            committed: true,
            violations: Vec::new(),
            neighbor_counts: vec![1, 2, 0, 1],
        };
        assert_eq!(report.mean_neighbors(), 1.0);
        assert_eq!(TickReport::new().mean_neighbors(), 0.0);
    }

    fn world_with(frame: &[AgentState], config: FlockConfig) -> World {
        let mut world = World::new();
        world.insert_resource(config);
        world.insert_resource(PendingSteering::new());
        world.insert_resource(TickReport::new());
        for state in frame {
            world.spawn(crate::components::BoidBundle::from(*state));
        }
        world
    }

    fn run_tick(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems((compute_steering, apply_steering).chain());
        schedule.run(world);
    }

    #[test]
    fn test_systems_apply_two_phase_tick() {
        let config = FlockConfig {
            steering: loose_params(),
            ..FlockConfig::default()
        };
        let mut world = world_with(&two_agent_frame(), config);
        run_tick(&mut world);

        assert!(world.resource::<TickReport>().committed);
        assert!(world.resource::<PendingSteering>().is_empty());

        let mut query = world.query::<(&AgentId, &Position, &Velocity)>();
        for (id, position, velocity) in query.iter(&world) {
            match id.0 {
                0 => {
                    assert_eq!(velocity.0, Vec3::new(-0.5, 1.0, 0.0));
                    assert_eq!(position.0, Vec3::new(-0.5, 1.0, 0.0));
                }
                1 => {
                    assert_eq!(velocity.0, Vec3::new(0.5, 0.0, 0.0));
                    assert_eq!(position.0, Vec3::new(1.5, 0.0, 0.0));
                }
                _ => panic!("Unexpected agent"),
            }
        }
    }

    #[test]
    fn test_non_finite_state_not_committed() {
        let frame = vec![
            AgentState::new(0, Vec3::ZERO, Vec3::ZERO),
            AgentState::new(1, Vec3::new(50.0, 0.0, 0.0), Vec3::new(f32::NAN, 0.0, 0.0)),
        ];
        let mut world = world_with(&frame, FlockConfig::default());
        run_tick(&mut world);

        let report = world.resource::<TickReport>();
        assert!(!report.committed);
        assert_eq!(
            report.violations,
            vec![StateViolation {
                agent_id: AgentId(1),
                field: StateField::Velocity,
            }]
        );

        // Counts describe the last committed state, not the rejected one
        assert!(report.neighbor_counts.is_empty());

        // The healthy agent keeps its pre-tick state too
        let mut query = world.query::<(&AgentId, &Position)>();
        for (id, position) in query.iter(&world) {
            if id.0 == 0 {
                assert_eq!(position.0, Vec3::ZERO);
            }
        }
    }
}
