//! # Chunk Creation Module
//!
//! Builds voxel grids cell by cell in canonical order. The
//! `GridCreationIterator` tracks the local position of the next cell so callers
//! only push block types; `generate` drives it from the density field.

use cgmath::{Point3, Vector3};

use crate::engine_state::voxels::{block::BlockTypeSize, density::DensityField};

use super::voxel_grid::VoxelGrid;

/// A builder that fills a grid one cell at a time.
///
/// Cells are pushed in canonical order: `z` advances first, then `y`, then `x`.
pub struct GridCreationIterator {
    size: usize,
    cells: Vec<BlockTypeSize>,
    /// Local position of the next cell to be pushed
    local_x: usize,
    local_y: usize,
    local_z: usize,
}

impl GridCreationIterator {
    /// Creates a builder for a `size³` grid.
    pub fn new(size: usize) -> Self {
        GridCreationIterator {
            size,
            cells: Vec::with_capacity(size * size * size),
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    /// Local position the next pushed block type will occupy, `None` once the
    /// grid is full.
    pub fn next_position(&self) -> Option<Point3<usize>> {
        if self.is_complete() {
            return None;
        }
        Some(Point3::new(self.local_x, self.local_y, self.local_z))
    }

    /// Returns true once every cell has been pushed.
    pub fn is_complete(&self) -> bool {
        self.cells.len() == self.size * self.size * self.size
    }

    /// Stores a block type at the current position and advances.
    pub fn push_block_type(&mut self, block_type: BlockTypeSize) {
        if self.is_complete() {
            return;
        }
        self.cells.push(block_type);

        self.local_z += 1;
        if self.local_z == self.size {
            self.local_z = 0;
            self.local_y += 1;
            if self.local_y == self.size {
                self.local_y = 0;
                self.local_x += 1;
            }
        }
    }

    /// Finalizes the grid. Cells that were never pushed are air.
    pub fn return_grid(mut self) -> VoxelGrid {
        let total = self.size * self.size * self.size;
        self.cells.resize(total, 0);
        VoxelGrid::from_cells(self.size, self.cells).unwrap_or_else(|| VoxelGrid::empty(self.size))
    }
}

/// Samples the density field for every cell of the chunk whose local cell
/// `(0, 0, 0)` sits at world block `origin`.
///
/// # Arguments
/// * `origin` - World block of the chunk's first cell
/// * `field` - Density field to sample
///
/// # Returns
/// The filled grid, sized from the field's settings.
pub fn generate(origin: Point3<i32>, field: &DensityField) -> VoxelGrid {
    let size = field.settings().chunk_size as usize;
    let mut gci = GridCreationIterator::new(size);

    while let Some(local) = gci.next_position() {
        let world = origin + Vector3::new(local.x as i32, local.y as i32, local.z as i32);
        gci.push_block_type(field.classify(world));
    }

    gci.return_grid()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine_state::voxels::chunk::settings::ChunkSettings;

    #[test]
    fn pushes_follow_canonical_order() {
        let mut gci = GridCreationIterator::new(2);
        for t in 1..=8 {
            gci.push_block_type(t);
        }
        assert!(gci.is_complete());
        let grid = gci.return_grid();
        assert_eq!(grid.get(Point3::new(0, 0, 1)), 2);
        assert_eq!(grid.get(Point3::new(0, 1, 0)), 3);
        assert_eq!(grid.get(Point3::new(1, 0, 0)), 5);
        assert_eq!(grid.get(Point3::new(1, 1, 1)), 8);
    }

    #[test]
    fn generated_cells_match_the_field() {
        let settings = Arc::new(ChunkSettings {
            chunk_size: 8,
            ..ChunkSettings::default()
        });
        let field = DensityField::new(42, settings);
        let origin = Point3::new(-8, 16, 24);
        let grid = generate(origin, &field);

        for x in 0..8 {
            for y in 0..8 {
                for z in 0..8 {
                    let world = Point3::new(origin.x + x, origin.y + y, origin.z + z);
                    let local = Point3::new(x as usize, y as usize, z as usize);
                    assert_eq!(grid.get(local), field.classify(world));
                }
            }
        }
    }
}
