use sandfall_common::Material;

/// Errors from constructing or editing a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("row {row} has {len} cells, expected {width}")]
    RaggedRows { row: usize, len: usize, width: usize },
    #[error("cell ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("unknown glyph {glyph:?} at line {line}")]
    UnknownGlyph { glyph: char, line: usize },
}

/// Rectangular grid of materials, row 0 at the top.
///
/// Cells live in one contiguous buffer indexed `y * width + x`, so a grid
/// cannot hold rows of unequal length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Material>,
}

impl Grid {
    /// Create a `width` x `height` grid with every cell empty.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Material::Empty; width * height],
        }
    }

    /// Build a grid from top-to-bottom rows.
    ///
    /// Every row must have the length of the first one.
    pub fn from_rows<R>(rows: impl IntoIterator<Item = R>) -> Result<Self, GridError>
    where
        R: AsRef<[Material]>,
    {
        let mut width = None;
        let mut height = 0;
        let mut cells = Vec::new();
        for (row, r) in rows.into_iter().enumerate() {
            let r = r.as_ref();
            let expected = *width.get_or_insert(r.len());
            if r.len() != expected {
                return Err(GridError::RaggedRows {
                    row,
                    len: r.len(),
                    width: expected,
                });
            }
            cells.extend_from_slice(r);
            height += 1;
        }
        Ok(Self {
            width: width.unwrap_or(0),
            height,
            cells,
        })
    }

    /// Parse a grid from lines of material glyphs (see [`Material::glyph`]).
    ///
    /// Leading and trailing whitespace on each line is ignored, as are blank
    /// lines.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut rows = Vec::new();
        for (line, raw) in text.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let row = raw
                .chars()
                .map(|glyph| {
                    Material::from_glyph(glyph).ok_or(GridError::UnknownGlyph { glyph, line })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells at all (a zero dimension).
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether every cell holds [`Material::Empty`].
    pub fn is_vacant(&self) -> bool {
        self.cells.iter().all(|m| m.is_empty())
    }

    /// Material at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<Material> {
        self.in_bounds(x, y).then(|| self.cells[self.index(x, y)])
    }

    /// Overwrite the material at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, material: Material) -> Result<(), GridError> {
        if !self.in_bounds(x, y) {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.put(x, y, material);
        Ok(())
    }

    /// Fill a rectangle, clipped to the grid. Returns the number of cells written.
    pub fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        material: Material,
    ) -> usize {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        let mut written = 0;
        for cy in y..y_end {
            for cx in x..x_end {
                self.put(cx, cy, material);
                written += 1;
            }
        }
        written
    }

    /// Display color of the cell at `(x, y)`.
    pub fn color_at(&self, x: usize, y: usize) -> Option<&'static str> {
        self.get(x, y).map(Material::display_color)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Material] {
        &self.cells
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Material]> {
        // chunks_exact panics on a zero chunk size; a zero-width grid has no cells anyway
        self.cells.chunks_exact(self.width.max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<Material>> {
        self.rows().map(<[Material]>::to_vec).collect()
    }

    /// Number of cells holding `material`.
    pub fn count(&self, material: Material) -> usize {
        self.cells.iter().filter(|&&m| m == material).count()
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Coordinates of `(x + dx, y + dy)` if they fall inside the grid.
    #[inline]
    pub fn offset(&self, x: usize, y: usize, dx: isize, dy: isize) -> Option<(usize, usize)> {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.in_bounds(nx, ny).then_some((nx, ny))
    }

    /// Read a cell the caller has already bounds-checked.
    #[inline]
    pub(crate) fn at(&self, x: usize, y: usize) -> Material {
        self.cells[self.index(x, y)]
    }

    /// Write a cell the caller has already bounds-checked.
    #[inline]
    pub(crate) fn put(&mut self, x: usize, y: usize, material: Material) {
        let i = self.index(x, y);
        self.cells[i] = material;
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}
