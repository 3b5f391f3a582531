//! # Voxel Grid
//!
//! Dense block storage for one chunk: `chunk_size³` bytes, one block type per
//! cell. Cells are laid out in canonical order, `index = (x * size + y) * size + z`,
//! so `x` is the outermost and `z` the innermost axis. The same order is used for
//! iteration, meshing and the save format.

use cgmath::Point3;

use crate::engine_state::voxels::block::{
    block_type::{self, AIR},
    BlockTypeSize,
};

/// Dense `size³` block grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    size: usize,
    cells: Vec<BlockTypeSize>,
}

impl VoxelGrid {
    /// Creates a grid filled with air.
    pub fn empty(size: usize) -> Self {
        VoxelGrid {
            size,
            cells: vec![AIR; size * size * size],
        }
    }

    /// Creates a grid with every cell set to `block_type`.
    pub fn filled(size: usize, block_type: BlockTypeSize) -> Self {
        VoxelGrid {
            size,
            cells: vec![block_type; size * size * size],
        }
    }

    /// Wraps raw cells stored in canonical order.
    ///
    /// # Returns
    /// `None` if `cells` does not hold exactly `size³` bytes.
    pub fn from_cells(size: usize, cells: Vec<BlockTypeSize>) -> Option<Self> {
        if cells.len() != size * size * size {
            return None;
        }
        Some(VoxelGrid { size, cells })
    }

    /// Edge length in cells.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw cells in canonical order.
    pub fn as_bytes(&self) -> &[BlockTypeSize] {
        &self.cells
    }

    /// Canonical index of a local cell.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.size + y) * self.size + z
    }

    /// Local cell of a canonical index.
    #[inline]
    pub fn position(&self, index: usize) -> Point3<usize> {
        let plane = self.size * self.size;
        Point3::new(index / plane, (index / self.size) % self.size, index % self.size)
    }

    /// Returns true if the local cell lies inside the grid.
    pub fn contains(&self, cell: Point3<i32>) -> bool {
        let size = self.size as i32;
        (0..size).contains(&cell.x) && (0..size).contains(&cell.y) && (0..size).contains(&cell.z)
    }

    /// Block type at a local cell.
    ///
    /// # Panics
    /// Panics if the cell is outside the grid.
    #[inline]
    pub fn get(&self, cell: Point3<usize>) -> BlockTypeSize {
        self.cells[self.index(cell.x, cell.y, cell.z)]
    }

    /// Block type at a possibly out-of-range cell, `None` outside the grid.
    pub fn get_checked(&self, cell: Point3<i32>) -> Option<BlockTypeSize> {
        if !self.contains(cell) {
            return None;
        }
        Some(self.cells[self.index(cell.x as usize, cell.y as usize, cell.z as usize)])
    }

    /// Overwrites one cell and returns the previous block type.
    ///
    /// # Panics
    /// Panics if the cell is outside the grid.
    pub fn set(&mut self, cell: Point3<usize>, block_type: BlockTypeSize) -> BlockTypeSize {
        let index = self.index(cell.x, cell.y, cell.z);
        std::mem::replace(&mut self.cells[index], block_type)
    }

    /// Returns true if the cell is inside the grid and solid.
    pub fn is_solid_at(&self, cell: Point3<i32>) -> bool {
        self.get_checked(cell).is_some_and(block_type::is_solid)
    }

    /// Number of solid cells.
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&t| block_type::is_solid(t)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_puts_z_innermost() {
        let grid = VoxelGrid::empty(4);
        assert_eq!(grid.index(0, 0, 1), 1);
        assert_eq!(grid.index(0, 1, 0), 4);
        assert_eq!(grid.index(1, 0, 0), 16);
        assert_eq!(grid.position(27), Point3::new(1, 2, 3));
    }

    #[test]
    fn bounds_are_checked() {
        let mut grid = VoxelGrid::empty(2);
        assert_eq!(grid.set(Point3::new(1, 1, 0), 3), AIR);
        assert!(grid.is_solid_at(Point3::new(1, 1, 0)));
        assert!(!grid.is_solid_at(Point3::new(2, 1, 0)));
        assert!(!grid.is_solid_at(Point3::new(-1, 1, 0)));
        assert_eq!(grid.solid_count(), 1);
        assert!(VoxelGrid::from_cells(2, vec![0; 7]).is_none());
    }
}
