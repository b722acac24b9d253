//! Developer tooling: read-only inspection of grids and simulations.
//!
//! # Invariants
//! - Tools never mutate the state they inspect.

mod census;
mod inspector;

pub use census::MaterialCensus;
pub use inspector::{GridInspector, SimulationSummary};
