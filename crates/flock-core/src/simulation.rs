//! Tick Driver
//!
//! [`Simulation`] owns the agent store (an ECS world) and the two-phase tick
//! schedule. The host calls [`Simulation::tick`] once per frame; the driver
//! never schedules itself and never looks at wall-clock time.

use bevy_ecs::prelude::*;
use std::collections::HashSet;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use flock_events::{FlockMetrics, FlockSnapshot};

use crate::components::{AgentId, AgentState, Boid, Position, Velocity};
use crate::config::FlockConfig;
use crate::error::SimError;
use crate::output::compute_metrics;
use crate::setup::{get_spawn_summary, spawn_agents, spawn_flock};
use crate::systems::{apply_steering, compute_steering, PendingSteering, TickReport};

/// Resource: global simulation clock
#[derive(Resource, Debug, Default)]
pub struct SimulationState {
    /// Number of committed ticks
    pub current_tick: u64,
}

/// A running flock.
pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    /// Create a flock of `config.population` boids placed from `seed`.
    pub fn new(config: FlockConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;

        let mut world = Self::base_world(config.clone());
        let mut rng = SmallRng::seed_from_u64(seed);
        spawn_flock(&mut world, config.population, &config.steering, &mut rng);

        let summary = get_spawn_summary(&mut world);
        tracing::info!(seed, "flock initialised: {}", summary);
        Ok(Self::with_world(world))
    }

    /// Create a flock from explicit states, spawned in the given order.
    ///
    /// `config.population` is ignored; the agent count is `states.len()`.
    /// Ids must be unique.
    pub fn from_agents(config: FlockConfig, states: &[AgentState]) -> Result<Self, SimError> {
        config.validate()?;

        let mut seen = HashSet::with_capacity(states.len());
        if let Some(duplicate) = states.iter().find(|state| !seen.insert(state.id)) {
            return Err(SimError::DuplicateAgentId {
                agent_id: duplicate.id,
            });
        }

        let mut world = Self::base_world(config);
        spawn_agents(&mut world, states);
        Ok(Self::with_world(world))
    }

    fn base_world(config: FlockConfig) -> World {
        let mut world = World::new();
        world.insert_resource(config);
        world.insert_resource(SimulationState::default());
        world.insert_resource(PendingSteering::new());
        world.insert_resource(TickReport::new());
        world
    }

    fn with_world(world: World) -> Self {
        let mut schedule = Schedule::default();
        // Phase A must finish for every boid before Phase B touches any
        schedule.add_systems((compute_steering, apply_steering).chain());

        Self { world, schedule }
    }

    /// Run one tick: Phase A for every boid, then Phase B for every boid.
    ///
    /// On a non-finite result the store keeps its pre-tick state, the clock
    /// does not advance, and the first offending agent is reported.
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.schedule.run(&mut self.world);

        let tick = self.current_tick();
        let report = self.world.resource::<TickReport>();
        if let Some(violation) = report.violations.first() {
            return Err(SimError::NonFiniteState {
                tick: tick + 1,
                agent_id: violation.agent_id,
                field: violation.field,
            });
        }

        let mean_neighbors = report.mean_neighbors();
        let mut state = self.world.resource_mut::<SimulationState>();
        state.current_tick += 1;
        tracing::debug!(tick = state.current_tick, mean_neighbors, "tick committed");
        Ok(())
    }

    /// Run `ticks` ticks, stopping at the first error.
    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    pub fn current_tick(&self) -> u64 {
        self.world.resource::<SimulationState>().current_tick
    }

    pub fn config(&self) -> &FlockConfig {
        self.world.resource::<FlockConfig>()
    }

    pub fn agent_count(&self) -> usize {
        self.world
            .iter_entities()
            .filter(|entity| entity.contains::<Boid>())
            .count()
    }

    /// Read-only copy of every boid's state, ordered by agent id.
    pub fn agents(&self) -> Vec<AgentState> {
        let mut agents: Vec<AgentState> = self
            .world
            .iter_entities()
            .filter(|entity| entity.contains::<Boid>())
            .filter_map(|entity| {
                Some(AgentState {
                    id: *entity.get::<AgentId>()?,
                    position: entity.get::<Position>()?.0,
                    velocity: entity.get::<Velocity>()?.0,
                })
            })
            .collect();
        agents.sort_by_key(|agent| agent.id);
        agents
    }

    /// State of one boid.
    pub fn agent(&self, id: AgentId) -> Option<AgentState> {
        self.agents().into_iter().find(|agent| agent.id == id)
    }

    /// Outcome of the most recent tick.
    pub fn last_report(&self) -> &TickReport {
        self.world.resource::<TickReport>()
    }

    /// Aggregate measures over the current store.
    pub fn metrics(&self) -> FlockMetrics {
        compute_metrics(
            &self.agents(),
            self.config().steering.position_range,
            self.last_report().mean_neighbors(),
        )
    }

    /// Snapshot of the current store for the rendering layer.
    pub fn snapshot(&self, snapshot_id: impl Into<String>, triggered_by: impl Into<String>) -> FlockSnapshot {
        let agents = self.agents();
        let mut snapshot = FlockSnapshot::new(snapshot_id, self.current_tick(), triggered_by);
        snapshot.metrics = compute_metrics(
            &agents,
            self.config().steering.position_range,
            self.last_report().mean_neighbors(),
        );
        snapshot.agents = agents.iter().map(AgentState::to_snapshot).collect();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteeringParams;
    use glam::Vec3;

    #[test]
    fn test_new_spawns_population() {
        let config = FlockConfig {
            population: 12,
            ..FlockConfig::default()
        };
        let sim = Simulation::new(config, 42).unwrap();

        assert_eq!(sim.agent_count(), 12);
        assert_eq!(sim.current_tick(), 0);
        let ids: Vec<u32> = sim.agents().iter().map(|a| a.id.0).collect();
        assert_eq!(ids, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FlockConfig {
            steering: SteeringParams {
                perception_radius: -1.0,
                ..SteeringParams::default()
            },
            ..FlockConfig::default()
        };
        assert!(matches!(Simulation::new(config, 1), Err(SimError::Config(_))));
    }

    #[test]
    fn test_tick_advances_clock() {
        let mut sim = Simulation::new(FlockConfig::default(), 3).unwrap();
        sim.run(5).unwrap();
        assert_eq!(sim.current_tick(), 5);
        assert!(sim.last_report().committed);
    }

    #[test]
    fn test_agent_count_fixed() {
        let mut sim = Simulation::new(FlockConfig::default(), 8).unwrap();
        let before = sim.agent_count();
        sim.run(20).unwrap();
        assert_eq!(sim.agent_count(), before);
    }

    #[test]
    fn test_non_finite_surfaces_error() {
        let states = [
            AgentState::new(0, Vec3::ZERO, Vec3::ZERO),
            AgentState::new(1, Vec3::new(f32::INFINITY, 0.0, 0.0), Vec3::ZERO),
        ];
        let mut sim = Simulation::from_agents(FlockConfig::default(), &states).unwrap();

        let err = sim.tick().unwrap_err();
        assert!(matches!(
            err,
            SimError::NonFiniteState {
                tick: 1,
                agent_id: AgentId(1),
                ..
            }
        ));
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.agent(AgentId(0)).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let states = [
            AgentState::new(0, Vec3::ZERO, Vec3::ZERO),
            AgentState::new(5, Vec3::X, Vec3::ZERO),
            AgentState::new(0, Vec3::Y, Vec3::ZERO),
        ];
        let result = Simulation::from_agents(FlockConfig::default(), &states);
        assert!(matches!(
            result,
            Err(SimError::DuplicateAgentId {
                agent_id: AgentId(0)
            })
        ));
    }

    #[test]
    fn test_snapshot_contents() {
        let states = [
            AgentState::new(5, Vec3::new(11.0, 0.0, 0.0), Vec3::ZERO),
            AgentState::new(2, Vec3::ZERO, Vec3::new(0.3, 0.0, 0.0)),
        ];
        let sim = Simulation::from_agents(FlockConfig::default(), &states).unwrap();
        let snapshot = sim.snapshot("snap_000000", "simulation_start");

        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.agents[0].agent_id, 2);
        assert_eq!(snapshot.agents[1].agent_id, 5);
        assert_eq!(snapshot.metrics.outside_bounds, 1);
    }
}
