use sandfall_common::Material;

use crate::engine::{self, MovePolicy};
use crate::grid::Grid;
use crate::random::SeededRandom;

/// Host-side simulation state: the current grid plus the seeded draws that
/// advance it.
///
/// Given the same starting grid, seed and policy, every run produces the
/// same sequence of grids.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid,
    tick: u64,
    rng: SeededRandom,
    policy: MovePolicy,
}

impl Simulation {
    /// Start from `grid` at tick 0.
    pub fn new(grid: Grid, seed: u64) -> Self {
        Self {
            grid,
            tick: 0,
            rng: SeededRandom::new(seed),
            policy: MovePolicy::default(),
        }
    }

    /// Start from an empty `width` x `height` grid.
    pub fn with_size(width: usize, height: usize, seed: u64) -> Self {
        Self::new(Grid::new(width, height), seed)
    }

    /// Use `policy` for every subsequent step.
    pub fn with_policy(mut self, policy: MovePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access for hosts that paint material between ticks.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn policy(&self) -> MovePolicy {
        self.policy
    }

    /// Advance one tick, replacing the grid with the engine's output.
    pub fn step(&mut self) {
        self.grid = engine::step_with(&self.grid, &mut self.rng, self.policy);
        self.tick += 1;
        tracing::debug!(
            tick = self.tick,
            occupied = self.grid.len() - self.grid.count(Material::Empty),
            "stepped"
        );
    }

    /// Advance `ticks` ticks.
    pub fn run(&mut self, ticks: u64) {
        let _span = tracing::debug_span!("run", from = self.tick, ticks).entered();
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Deterministic FNV-1a hash of the tick, dimensions and cells.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&self.tick.to_le_bytes());
        mix(&(self.grid.width() as u64).to_le_bytes());
        mix(&(self.grid.height() as u64).to_le_bytes());
        for &cell in self.grid.cells() {
            mix(&[cell as u8]);
        }
        h
    }
}
