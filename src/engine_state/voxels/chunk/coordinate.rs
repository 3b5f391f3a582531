//! Chunk lattice coordinates and their conversions to and from block space.

use cgmath::Point3;

/// Integer position of a chunk on the chunk lattice.
///
/// A chunk with coordinate `c` covers the world blocks `c * chunk_size ..
/// (c + 1) * chunk_size` on every axis. All conversions use floor division so
/// negative world positions land in the correct chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoordinate {
    /// Lattice position along X
    pub x: i32,
    /// Lattice position along Y
    pub y: i32,
    /// Lattice position along Z
    pub z: i32,
}

impl ChunkCoordinate {
    /// Creates a coordinate from its lattice components.
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk containing a continuous world position, `floor(pos / chunk_size)`.
    pub fn from_world_position(position: Point3<f32>, chunk_size: u32) -> Self {
        let size = chunk_size as f32;
        Self {
            x: (position.x / size).floor() as i32,
            y: (position.y / size).floor() as i32,
            z: (position.z / size).floor() as i32,
        }
    }

    /// The chunk owning an integer world block.
    pub fn from_block(block: Point3<i32>, chunk_size: u32) -> Self {
        let size = chunk_size as i32;
        Self {
            x: block.x.div_euclid(size),
            y: block.y.div_euclid(size),
            z: block.z.div_euclid(size),
        }
    }

    /// World block at local cell `(0, 0, 0)` of this chunk.
    ///
    /// Saturates at the edge of the `i32` block space. Chunks that need
    /// saturation are never streamed, see [`Self::checked_origin`].
    pub fn origin(&self, chunk_size: u32) -> Point3<i32> {
        let size = chunk_size as i32;
        Point3::new(
            self.x.saturating_mul(size),
            self.y.saturating_mul(size),
            self.z.saturating_mul(size),
        )
    }

    /// World block at local cell `(0, 0, 0)`, or `None` if any block of the
    /// chunk lies outside the `i32` block space.
    pub fn checked_origin(&self, chunk_size: u32) -> Option<Point3<i32>> {
        let size = i32::try_from(chunk_size).ok()?;
        let axis = |c: i32| {
            let first = c.checked_mul(size)?;
            first.checked_add(size - 1)?;
            Some(first)
        };
        Some(Point3::new(axis(self.x)?, axis(self.y)?, axis(self.z)?))
    }

    /// Returns true if every block of the chunk has an `i32` world position.
    pub fn is_addressable(&self, chunk_size: u32) -> bool {
        self.checked_origin(chunk_size).is_some()
    }

    /// Local cell of `block` inside this chunk, or `None` if the block lies in
    /// another chunk.
    pub fn local_cell(&self, block: Point3<i32>, chunk_size: u32) -> Option<Point3<usize>> {
        if Self::from_block(block, chunk_size) != *self {
            return None;
        }
        let size = chunk_size as i32;
        Some(Point3::new(
            block.x.rem_euclid(size) as usize,
            block.y.rem_euclid(size) as usize,
            block.z.rem_euclid(size) as usize,
        ))
    }
}

impl From<ChunkCoordinate> for Point3<i32> {
    fn from(coordinate: ChunkCoordinate) -> Self {
        Point3::new(coordinate.x, coordinate.y, coordinate.z)
    }
}
