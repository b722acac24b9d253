use std::fmt;

use sandfall_kernel::{Grid, MovePolicy, Simulation};

use crate::census::MaterialCensus;

/// Grid inspector for developer tooling.
///
/// Provides read-only queries against simulation state for debugging and
/// headless runs.
pub struct GridInspector;

impl GridInspector {
    /// Produce a summary of the simulation state.
    pub fn summary(sim: &Simulation) -> SimulationSummary {
        let census = MaterialCensus::of(sim.grid());
        SimulationSummary {
            tick: sim.tick(),
            seed: sim.seed(),
            width: sim.grid().width(),
            height: sim.grid().height(),
            policy: sim.policy(),
            occupied: census.non_empty(),
            hash: sim.state_hash(),
            census,
        }
    }

    /// One line of material glyphs per row, top row first.
    pub fn glyphs(grid: &Grid) -> String {
        let mut out = String::with_capacity(grid.len() + grid.height());
        for row in grid.rows() {
            out.extend(row.iter().map(|m| m.glyph()));
            out.push('\n');
        }
        out
    }
}

/// Summary of simulation state for the inspector.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub tick: u64,
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub policy: MovePolicy,
    pub occupied: usize,
    pub hash: u64,
    pub census: MaterialCensus,
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Simulation: tick={} seed={} size={}x{} policy={:?} occupied={} hash={:#018x} [{}]",
            self.tick,
            self.seed,
            self.width,
            self.height,
            self.policy,
            self.occupied,
            self.hash,
            self.census
        )
    }
}
