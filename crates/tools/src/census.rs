use std::collections::BTreeMap;
use std::fmt;

use sandfall_common::Material;
use sandfall_kernel::Grid;

/// Cell counts per material. Materials with no cells are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialCensus {
    counts: BTreeMap<Material, usize>,
}

impl MaterialCensus {
    pub fn of(grid: &Grid) -> Self {
        let mut counts = BTreeMap::new();
        for &cell in grid.cells() {
            *counts.entry(cell).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, material: Material) -> usize {
        self.counts.get(&material).copied().unwrap_or(0)
    }

    /// Total number of cells counted.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Cells holding anything but [`Material::Empty`].
    pub fn non_empty(&self) -> usize {
        self.total() - self.get(Material::Empty)
    }

    /// Counts in material order.
    pub fn iter(&self) -> impl Iterator<Item = (Material, usize)> + '_ {
        self.counts.iter().map(|(&m, &n)| (m, n))
    }

    /// Per-material change from `earlier` to `self`, zero entries omitted.
    pub fn delta(&self, earlier: &MaterialCensus) -> BTreeMap<Material, isize> {
        Material::ALL
            .into_iter()
            .map(|m| (m, self.get(m) as isize - earlier.get(m) as isize))
            .filter(|&(_, d)| d != 0)
            .collect()
    }
}

impl fmt::Display for MaterialCensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (m, n) in self.iter().filter(|&(m, _)| !m.is_empty()) {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{m}={n}")?;
            first = false;
        }
        if first {
            f.write_str("(vacant)")?;
        }
        Ok(())
    }
}
