//! Determinism verification tests
//!
//! The same seed and config must reproduce a run exactly, and the neighbor
//! search and parallel options must never change the result.

use flock_core::{AgentState, FlockConfig, NeighborSearch, RuntimeConfig, Simulation};

fn run(config: FlockConfig, seed: u64, ticks: u64) -> Vec<AgentState> {
    let mut sim = Simulation::new(config, seed).unwrap();
    sim.run(ticks).unwrap();
    sim.agents()
}

fn config_with(population: usize, runtime: RuntimeConfig) -> FlockConfig {
    FlockConfig {
        population,
        runtime,
        ..FlockConfig::default()
    }
}

/// Test that the same seed produces identical flocks
#[test]
fn test_same_seed_same_flock() {
    let first = run(FlockConfig::default(), 42, 200);
    let second = run(FlockConfig::default(), 42, 200);

    assert_eq!(first, second, "Runs with the same seed should be identical");
}

/// Test that different seeds produce different starting flocks
#[test]
fn test_different_seeds_differ() {
    let first = run(FlockConfig::default(), 42, 0);
    let second = run(FlockConfig::default(), 43, 0);

    assert_ne!(first, second, "Different seeds should place boids differently");
}

/// Test that the grid search matches all-pairs bit for bit
#[test]
fn test_grid_matches_all_pairs() {
    let all_pairs = run(config_with(120, RuntimeConfig::default()), 7, 150);
    let grid = run(
        config_with(
            120,
            RuntimeConfig {
                neighbor_search: NeighborSearch::Grid,
                parallel: false,
            },
        ),
        7,
        150,
    );

    assert_eq!(all_pairs, grid);
}

/// Test that parallel steering matches serial steering
#[test]
fn test_parallel_matches_serial() {
    let serial = run(config_with(120, RuntimeConfig::default()), 11, 150);
    let parallel = run(
        config_with(
            120,
            RuntimeConfig {
                neighbor_search: NeighborSearch::AllPairs,
                parallel: true,
            },
        ),
        11,
        150,
    );
    let parallel_grid = run(
        config_with(
            120,
            RuntimeConfig {
                neighbor_search: NeighborSearch::Grid,
                parallel: true,
            },
        ),
        11,
        150,
    );

    assert_eq!(serial, parallel);
    assert_eq!(serial, parallel_grid);
}

/// Test that ticking in chunks gives the same result as one long run
#[test]
fn test_chunked_run_matches() {
    let whole = run(FlockConfig::default(), 99, 60);

    let mut sim = Simulation::new(FlockConfig::default(), 99).unwrap();
    for _ in 0..3 {
        sim.run(20).unwrap();
    }

    assert_eq!(sim.current_tick(), 60);
    assert_eq!(whole, sim.agents());
}
