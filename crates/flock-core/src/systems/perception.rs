//! Perception
//!
//! Finds each boid's neighbors within the perception radius and accumulates
//! the raw sums the steering rules need.
//!
//! The default search is all-pairs: every subject scans every other agent, so
//! a tick costs O(n²). That is fine up to the low hundreds of boids. Past
//! that, the spatial grid cuts the scan to the 27 cells around the subject.

use glam::{IVec3, Vec3};
use std::collections::HashMap;

use crate::components::{AgentId, AgentState};
use crate::config::NeighborSearch;

/// Raw accumulations over one subject's neighbors
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NeighborSums {
    pub count: u32,
    /// Sum of neighbor velocities
    pub alignment: Vec3,
    /// Sum of neighbor positions
    pub cohesion: Vec3,
    /// Sum of (subject - neighbor) / distance²
    pub separation: Vec3,
}

impl NeighborSums {
    pub fn is_alone(&self) -> bool {
        self.count == 0
    }
}

/// Accumulate neighbor sums for `frame[subject]` over the given candidates.
///
/// Candidates may include the subject itself; it is skipped by index, never by
/// position, so two boids sharing a point are still told apart. Candidates at
/// distance zero contribute nothing.
pub fn evaluate_neighbors(
    subject: usize,
    frame: &[AgentState],
    candidates: impl IntoIterator<Item = usize>,
    perception_radius: f32,
) -> NeighborSums {
    let me = &frame[subject];
    let mut sums = NeighborSums::default();

    for index in candidates {
        if index == subject {
            continue;
        }
        let other = &frame[index];
        let offset = me.position - other.position;
        let distance_sq = offset.length_squared();
        let distance = distance_sq.sqrt();

        if distance > 0.0 && distance < perception_radius {
            sums.count += 1;
            sums.alignment += other.velocity;
            sums.cohesion += other.position;
            sums.separation += offset / distance_sq;
        }
    }

    sums
}

/// Uniform 3-D hash grid over a frame.
///
/// Cells are cubes with edge `cell_size`, keyed by integer coordinates, so the
/// grid needs no world bounds and boids that drift far out stay indexable.
#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Build a grid holding every agent of the frame.
    pub fn from_frame(frame: &[AgentState], cell_size: f32) -> Self {
        let mut grid = Self::new(cell_size);
        for (index, agent) in frame.iter().enumerate() {
            grid.insert(index, agent.position);
        }
        grid
    }

    #[inline]
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size).floor().as_ivec3()
    }

    pub fn insert(&mut self, index: usize, position: Vec3) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(index);
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Indices in the cell containing `position` and its 26 neighbors.
    ///
    /// Returned in ascending index order, the same order the all-pairs scan
    /// visits them, so both searches sum in the same sequence.
    pub fn nearby_indices(&self, position: Vec3) -> Vec<usize> {
        let center = self.cell_of(position);
        let mut result = Vec::new();

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let cell = center + IVec3::new(dx, dy, dz);
                    if let Some(indices) = self.cells.get(&cell) {
                        result.extend_from_slice(indices);
                    }
                }
            }
        }

        result.sort_unstable();
        result
    }
}

/// Neighbor lookup structure for one tick.
#[derive(Debug, Clone)]
pub enum NeighborIndex {
    AllPairs,
    Grid(SpatialGrid),
}

impl NeighborIndex {
    pub fn build(search: NeighborSearch, frame: &[AgentState], perception_radius: f32) -> Self {
        match search {
            NeighborSearch::AllPairs => NeighborIndex::AllPairs,
            NeighborSearch::Grid => {
                NeighborIndex::Grid(SpatialGrid::from_frame(frame, perception_radius))
            }
        }
    }

    /// Neighbor sums for `frame[subject]` using this index.
    pub fn evaluate(&self, subject: usize, frame: &[AgentState], perception_radius: f32) -> NeighborSums {
        match self {
            NeighborIndex::AllPairs => {
                evaluate_neighbors(subject, frame, 0..frame.len(), perception_radius)
            }
            NeighborIndex::Grid(grid) => {
                let candidates = grid.nearby_indices(frame[subject].position);
                evaluate_neighbors(subject, frame, candidates, perception_radius)
            }
        }
    }

    /// IDs of the agents `frame[subject]` perceives this tick.
    pub fn neighbors_of(&self, subject: usize, frame: &[AgentState], perception_radius: f32) -> Vec<AgentId> {
        let me = frame[subject].position;
        let candidates: Vec<usize> = match self {
            NeighborIndex::AllPairs => (0..frame.len()).collect(),
            NeighborIndex::Grid(grid) => grid.nearby_indices(me),
        };

        candidates
            .into_iter()
            .filter(|&index| index != subject)
            .filter(|&index| {
                let distance = me.distance(frame[index].position);
                distance > 0.0 && distance < perception_radius
            })
            .map(|index| frame[index].id)
            .collect()
    }
}
