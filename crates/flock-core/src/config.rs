//! Configuration loading for the flock simulation.
//!
//! Simulation parameters are read from a TOML file and stay fixed for the
//! lifetime of a run. The whole config is inserted into the ECS world as a
//! resource so systems read it instead of ambient globals.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-axis boundary nudge. Fixed, not part of the tunable parameter set.
pub const TURN_FACTOR: f32 = 0.2;

/// Complete flock configuration.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockConfig {
    /// Number of boids created at start
    #[serde(default = "default_population")]
    pub population: usize,
    /// Steering rule parameters
    #[serde(default)]
    pub steering: SteeringParams,
    /// Execution strategy settings
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

fn default_population() -> usize {
    20
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            steering: SteeringParams::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl FlockConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every parameter is usable before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.steering.validate()
    }
}

/// Steering rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    /// Neighbors closer than this (strictly) are perceived
    pub perception_radius: f32,
    /// Velocity magnitude cap applied after every tick
    pub max_speed: f32,
    /// Magnitude cap on each of alignment, cohesion and separation
    pub max_force: f32,
    pub separation_factor: f32,
    pub alignment_factor: f32,
    pub cohesion_factor: f32,
    pub bounds_factor: f32,
    /// Side of the spawn cube, and half-width of the containment box
    pub position_range: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            perception_radius: 7.0,
            max_speed: 0.5,
            max_force: 0.05,
            separation_factor: 1.5,
            alignment_factor: 1.0,
            cohesion_factor: 1.0,
            bounds_factor: 1.0,
            position_range: 10.0,
        }
    }
}

impl SteeringParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("perception_radius", self.perception_radius),
            ("max_speed", self.max_speed),
            ("max_force", self.max_force),
            ("separation_factor", self.separation_factor),
            ("alignment_factor", self.alignment_factor),
            ("cohesion_factor", self.cohesion_factor),
            ("bounds_factor", self.bounds_factor),
            ("position_range", self.position_range),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
            if value < 0.0 {
                return Err(ConfigError::invalid(field, "must not be negative"));
            }
        }

        if self.perception_radius == 0.0 {
            return Err(ConfigError::invalid("perception_radius", "must be positive"));
        }
        if self.position_range == 0.0 {
            return Err(ConfigError::invalid("position_range", "must be positive"));
        }

        Ok(())
    }
}

/// How the neighbor evaluator finds candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    /// Scan every other agent (quadratic)
    #[default]
    AllPairs,
    /// Hash agents into cubes of side `perception_radius` first
    Grid,
}

/// Execution strategy settings. None of these change results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    pub neighbor_search: NeighborSearch,
    /// Compute Phase A across threads with rayon
    pub parallel: bool,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Flock Configuration

population = 20

[steering]
perception_radius = 7.0
max_speed = 0.5
max_force = 0.05
separation_factor = 1.5
alignment_factor = 1.0
cohesion_factor = 1.0
bounds_factor = 1.0
position_range = 10.0

[runtime]
neighbor_search = "all_pairs"
parallel = false
"#
    .to_string()
}
