//! Flock Setup
//!
//! Initial placement of boids in the agent store.

pub mod agents;

pub use agents::*;
