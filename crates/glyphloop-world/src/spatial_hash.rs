//! Uniform spatial hash over the unit square.
//!
//! The grid is rebuilt once per step from the population's positions and
//! reuses its cell allocations between steps. Queries visit only the cells
//! that overlap the search radius, so neighbor search cost tracks local
//! density instead of population size.

/// Cells per side.
pub const HASH_DIM: usize = 16;

/// A 16x16 bucket grid of quantum indices.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cells: Vec<Vec<usize>>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialHash {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self {
            cells: vec![Vec::new(); HASH_DIM * HASH_DIM],
        }
    }

    /// Clear every bucket and re-insert the given points by index.
    pub fn rebuild<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        for bucket in &mut self.cells {
            bucket.clear();
        }
        for (index, (x, y)) in points.into_iter().enumerate() {
            let cell = cell_index(x, y, HASH_DIM);
            if let Some(bucket) = self.cells.get_mut(cell) {
                bucket.push(index);
            }
        }
    }

    /// Call `visit` for every index in cells overlapping the square of
    /// half-width `radius` around `(x, y)`.
    ///
    /// Candidates may lie outside the radius; callers filter by distance.
    pub fn for_each_candidate<F>(&self, x: f64, y: f64, radius: f64, mut visit: F)
    where
        F: FnMut(usize),
    {
        let reach = (radius.max(0.0) * HASH_DIM as f64).ceil() as usize;
        let cx = grid_cell(x, HASH_DIM);
        let cy = grid_cell(y, HASH_DIM);
        let x_lo = cx.saturating_sub(reach);
        let y_lo = cy.saturating_sub(reach);
        let x_hi = cx.saturating_add(reach).min(HASH_DIM - 1);
        let y_hi = cy.saturating_add(reach).min(HASH_DIM - 1);
        for gy in y_lo..=y_hi {
            for gx in x_lo..=x_hi {
                if let Some(bucket) = self.cells.get(gy * HASH_DIM + gx) {
                    for &index in bucket {
                        visit(index);
                    }
                }
            }
        }
    }

    /// Total number of indexed points.
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Whether no points are indexed.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }
}

/// Map a unit-square coordinate to a clamped index on a `dim`-wide grid.
///
/// Non-finite and negative coordinates land in cell 0.
pub(crate) fn grid_cell(v: f64, dim: usize) -> usize {
    if !v.is_finite() || v <= 0.0 {
        return 0;
    }
    ((v * dim as f64).floor() as usize).min(dim.saturating_sub(1))
}

/// Row-major cell index of `(x, y)` on a `dim` x `dim` grid.
pub(crate) fn cell_index(x: f64, y: f64, dim: usize) -> usize {
    grid_cell(y, dim) * dim + grid_cell(x, dim)
}
