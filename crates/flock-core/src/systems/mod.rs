//! ECS Systems
//!
//! Perception, steering and the two-phase integrator that make up a tick.

pub mod perception;
pub mod steering;
pub mod integrate;

// Re-export commonly used systems
pub use perception::{evaluate_neighbors, NeighborIndex, NeighborSums, SpatialGrid};
pub use steering::{boundary_force, clamp_magnitude, steer, SteeringForces};
pub use integrate::{
    apply_steering, compute_accelerations, compute_steering, integrate, PendingForce,
    PendingSteering, StateViolation, TickReport,
};
