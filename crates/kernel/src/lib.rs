//! Simulation kernel: cell grid, update rules, deterministic stepping.
//!
//! # Invariants
//! - `engine::step` is pure with respect to its inputs: same grid and same
//!   sequence of draws give the same output grid.
//! - Every rule reads the pre-tick grid and writes a separate output grid.
//! - Grids are rectangular by construction.

pub mod engine;
pub mod grid;
pub mod random;
pub mod scene;
pub mod simulation;

pub use engine::{MovePolicy, step, step_with};
pub use grid::{Grid, GridError};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use sandfall_common::{Material, MaterialDescriptor};
pub use scene::{Fill, Scene, SceneError};
pub use simulation::Simulation;
