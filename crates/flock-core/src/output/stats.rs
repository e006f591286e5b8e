//! Statistics Output
//!
//! Per-tick flock metrics and a whole-run summary.

use glam::Vec3;
use serde::Serialize;
use std::fs;
use std::path::Path;

use flock_events::FlockMetrics;

use crate::components::AgentState;

/// File name of the run statistics inside the output directory
pub const STATS_FILE: &str = "stats.json";

/// Aggregate metrics over a set of agent states
pub fn compute_metrics(agents: &[AgentState], position_range: f32, mean_neighbors: f32) -> FlockMetrics {
    if agents.is_empty() {
        return FlockMetrics::default();
    }

    let count = agents.len() as f32;
    let mut position_sum = Vec3::ZERO;
    let mut speed_sum = 0.0f32;
    let mut max_speed = 0.0f32;
    let mut outside_bounds = 0u32;

    for agent in agents {
        position_sum += agent.position;
        let speed = agent.speed();
        speed_sum += speed;
        max_speed = max_speed.max(speed);
        if agent.position.abs().max_element() > position_range {
            outside_bounds += 1;
        }
    }

    FlockMetrics {
        centroid: (position_sum / count).to_array(),
        mean_speed: speed_sum / count,
        max_speed,
        mean_neighbors,
        outside_bounds,
    }
}

/// Summary of one recorded tick
#[derive(Debug, Clone, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub mean_speed: f32,
    pub mean_neighbors: f32,
    pub outside_bounds: u32,
}

/// Overall run statistics
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub total_ticks: u64,
    pub peak_speed: f32,
    pub peak_outside_bounds: u32,
    pub average_neighbors: f64,
    pub final_metrics: FlockMetrics,
    pub tick_history: Vec<TickSummary>,
}

/// Accumulates statistics during a run
#[derive(Debug, Default)]
pub struct StatsCollector {
    ticks_recorded: u64,
    peak_speed: f32,
    peak_outside_bounds: u32,
    neighbor_sum: f64,
    history_interval: u64,
    tick_history: Vec<TickSummary>,
    last_metrics: FlockMetrics,
}

impl StatsCollector {
    /// Keep a history entry every `history_interval` ticks (0 keeps none).
    pub fn new(history_interval: u64) -> Self {
        Self {
            history_interval,
            ..Self::default()
        }
    }

    /// Record metrics taken after `tick`
    pub fn record_tick(&mut self, tick: u64, metrics: &FlockMetrics) {
        self.ticks_recorded += 1;
        self.peak_speed = self.peak_speed.max(metrics.max_speed);
        self.peak_outside_bounds = self.peak_outside_bounds.max(metrics.outside_bounds);
        self.neighbor_sum += metrics.mean_neighbors as f64;

        if self.history_interval > 0 && tick % self.history_interval == 0 {
            self.tick_history.push(TickSummary {
                tick,
                mean_speed: metrics.mean_speed,
                mean_neighbors: metrics.mean_neighbors,
                outside_bounds: metrics.outside_bounds,
            });
        }
        self.last_metrics = metrics.clone();
    }

    /// Generate final statistics
    pub fn generate_stats(&self) -> RunStats {
        let average_neighbors = if self.ticks_recorded > 0 {
            self.neighbor_sum / self.ticks_recorded as f64
        } else {
            0.0
        };

        RunStats {
            total_ticks: self.ticks_recorded,
            peak_speed: self.peak_speed,
            peak_outside_bounds: self.peak_outside_bounds,
            average_neighbors,
            final_metrics: self.last_metrics.clone(),
            tick_history: self.tick_history.clone(),
        }
    }

    /// Write the run statistics into `output_dir`
    pub fn write_stats(&self, output_dir: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.generate_stats())?;
        fs::write(output_dir.as_ref().join(STATS_FILE), json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_empty() {
        assert_eq!(compute_metrics(&[], 10.0, 0.0), FlockMetrics::default());
    }

    #[test]
    fn test_metrics_values() {
        let agents = vec![
            AgentState::new(0, Vec3::new(-2.0, 0.0, 0.0), Vec3::new(3.0, 4.0, 0.0)),
            AgentState::new(1, Vec3::new(12.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
        ];

        let metrics = compute_metrics(&agents, 10.0, 1.0);
        assert_eq!(metrics.centroid, [5.0, 0.0, 0.0]);
        assert_eq!(metrics.mean_speed, 3.0);
        assert_eq!(metrics.max_speed, 5.0);
        assert_eq!(metrics.mean_neighbors, 1.0);
        assert_eq!(metrics.outside_bounds, 1);
    }

    #[test]
    fn test_on_bound_is_inside() {
        let agents = vec![AgentState::new(0, Vec3::new(10.0, -10.0, 10.0), Vec3::ZERO)];
        assert_eq!(compute_metrics(&agents, 10.0, 0.0).outside_bounds, 0);
    }

    #[test]
    fn test_collector() {
        let mut collector = StatsCollector::new(2);
        for tick in 1..=4 {
            let metrics = FlockMetrics {
                max_speed: tick as f32 * 0.1,
                mean_neighbors: 2.0,
                outside_bounds: (tick % 3) as u32,
                ..FlockMetrics::default()
            };
            collector.record_tick(tick, &metrics);
        }

        let stats = collector.generate_stats();
        assert_eq!(stats.total_ticks, 4);
        assert_eq!(stats.peak_speed, 0.4);
        assert_eq!(stats.peak_outside_bounds, 2);
        assert_eq!(stats.average_neighbors, 2.0);
        assert_eq!(stats.tick_history.len(), 2);
        assert_eq!(stats.final_metrics.max_speed, 0.4);
    }
}
