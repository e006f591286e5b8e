//! ECS Components
//!
//! Entity components making up the agent store.

pub mod agent;

pub use agent::*;
