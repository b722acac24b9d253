//! Declarative starting layouts.
//!
//! A scene is a grid size, a seed and a list of rectangular fills painted in
//! order. Hosts load scenes from whatever text format they like; the types
//! here only derive serde.

use sandfall_common::Material;
use serde::{Deserialize, Serialize};

use crate::engine::MovePolicy;
use crate::grid::Grid;
use crate::simulation::Simulation;

/// Errors from building a scene.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("fill {index} ({material}) starts at ({x}, {y}), outside the {width}x{height} grid")]
    FillOutOfBounds {
        index: usize,
        material: Material,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// A rectangle of one material. Parts hanging off the grid are clipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub material: Material,
    pub x: usize,
    pub y: usize,
    #[serde(default = "one")]
    pub width: usize,
    #[serde(default = "one")]
    pub height: usize,
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub policy: MovePolicy,
    #[serde(default)]
    pub fills: Vec<Fill>,
}

impl Scene {
    /// An empty scene.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            seed: 0,
            policy: MovePolicy::default(),
            fills: Vec::new(),
        }
    }

    /// Append a fill.
    pub fn fill(
        mut self,
        material: Material,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Self {
        self.fills.push(Fill {
            material,
            x,
            y,
            width,
            height,
        });
        self
    }

    /// A stone basin with a little of every material dropped into it.
    pub fn demo(width: usize, height: usize) -> Self {
        let mut scene = Self::new(width, height);
        if width < 8 || height < 8 {
            return scene;
        }
        let floor = height - 1;
        let col = |fraction: usize| width * fraction / 8;
        scene = scene
            .fill(Material::Stone, 0, floor, width, 1)
            .fill(Material::Stone, 0, 0, 1, height)
            .fill(Material::Stone, width - 1, 0, 1, height)
            .fill(Material::Sand, col(1), 1, col(1).max(1), 3)
            .fill(Material::Water, col(3), 1, col(1).max(1), 2)
            .fill(Material::Oil, col(3), 4, col(1).max(1), 1)
            .fill(Material::Wood, col(5), floor - 3, 2, 3)
            .fill(Material::Fire, col(5), floor - 4, 1, 1)
            .fill(Material::Acid, col(6), 2, 2, 1)
            .fill(Material::Lava, col(7) - 1, 1, 1, 2)
            .fill(Material::Smoke, col(4), 1, 1, 1);
        scene
    }

    /// Paint every fill onto a fresh grid.
    pub fn build(&self) -> Result<Grid, SceneError> {
        let mut grid = Grid::new(self.width, self.height);
        for (index, fill) in self.fills.iter().enumerate() {
            if !grid.in_bounds(fill.x, fill.y) {
                return Err(SceneError::FillOutOfBounds {
                    index,
                    material: fill.material,
                    x: fill.x,
                    y: fill.y,
                    width: self.width,
                    height: self.height,
                });
            }
            let written = grid.fill_rect(fill.x, fill.y, fill.width, fill.height, fill.material);
            tracing::trace!(index, material = %fill.material, written, "applied fill");
        }
        Ok(grid)
    }

    /// Build the grid and wrap it in a [`Simulation`] with this scene's seed and policy.
    pub fn simulation(&self) -> Result<Simulation, SceneError> {
        Ok(Simulation::new(self.build()?, self.seed).with_policy(self.policy))
    }
}
