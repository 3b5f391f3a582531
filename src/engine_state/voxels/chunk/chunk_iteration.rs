//! # Chunk Iteration Module
//!
//! Iterates over the solid cells of a voxel grid in canonical order, skipping
//! air. The mesher walks grids exclusively through this iterator so that the
//! generated geometry is ordered deterministically.

use cgmath::Point3;

use crate::engine_state::voxels::block::{block_type, BlockTypeSize};

use super::voxel_grid::VoxelGrid;

/// An iterator over all non-air cells of a grid.
pub struct GridBlockIterator<'a> {
    grid: &'a VoxelGrid,
    /// Canonical index of the next cell to inspect
    offset: usize,
}

impl<'a> GridBlockIterator<'a> {
    /// Creates an iterator positioned before the first cell.
    pub fn new(grid: &'a VoxelGrid) -> Self {
        GridBlockIterator { grid, offset: 0 }
    }
}

impl Iterator for GridBlockIterator<'_> {
    type Item = (Point3<usize>, BlockTypeSize);

    fn next(&mut self) -> Option<Self::Item> {
        let cells = self.grid.as_bytes();
        while self.offset < cells.len() {
            let index = self.offset;
            self.offset += 1;
            let block_type = cells[index];
            if block_type::is_solid(block_type) {
                return Some((self.grid.position(index), block_type));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_only_solid_cells_in_order() {
        let mut grid = VoxelGrid::empty(3);
        grid.set(Point3::new(2, 0, 1), 1);
        grid.set(Point3::new(0, 2, 2), 2);
        grid.set(Point3::new(0, 0, 1), 3);

        let visited: Vec<_> = GridBlockIterator::new(&grid).collect();
        assert_eq!(
            visited,
            vec![
                (Point3::new(0, 0, 1), 3),
                (Point3::new(0, 2, 2), 2),
                (Point3::new(2, 0, 1), 1),
            ]
        );
    }
}
