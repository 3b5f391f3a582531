//! # Block Targeting
//!
//! Converts a raycast hit on chunk geometry into an integer block coordinate.
//! Blocks are unit cubes centred on integer coordinates, so a hit on a face
//! lies half a block away from the centre of the block that owns the face and
//! half a block away from the cell in front of it.
//!
//! The raycast itself belongs to the physics backend; this module only
//! interprets its result.

use cgmath::{Point3, Vector3};

use super::{chunk::coordinate::ChunkCoordinate, world::WorldError};

/// Magnitude a normal component must exceed to count as facing along its axis.
pub const AXIS_THRESHOLD: f32 = 0.1;

/// A ray hit reported by the physics backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    /// World-space hit point on the surface
    pub point: Point3<f32>,
    /// Outward surface normal at the hit point
    pub normal: Vector3<f32>,
    /// Chunk whose collision mesh was hit
    pub chunk: ChunkCoordinate,
}

/// Which of the two cells sharing the hit face to return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetCell {
    /// The solid block that was hit, for removal.
    Hit,
    /// The cell in front of the hit face, for placement.
    Adjacent,
}

/// How to turn a point on a face into a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetResolution {
    /// Move half a block along the normal, then round every axis.
    #[default]
    NormalOffset,
    /// Floor or ceil on axes the normal clearly points along, round the others.
    AxisSelect,
}

impl RaycastHit {
    /// Resolves the hit to a block coordinate.
    ///
    /// # Arguments
    /// * `cell` - Whether to return the hit block or the cell in front of it
    /// * `resolution` - Resolution strategy
    pub fn resolve(&self, cell: TargetCell, resolution: TargetResolution) -> Point3<i32> {
        match resolution {
            TargetResolution::NormalOffset => {
                let direction: f32 = match cell {
                    TargetCell::Hit => -0.5,
                    TargetCell::Adjacent => 0.5,
                };
                let p = self.point + self.normal * direction;
                Point3::new(
                    p.x.round() as i32,
                    p.y.round() as i32,
                    p.z.round() as i32,
                )
            }
            TargetResolution::AxisSelect => Point3::new(
                select_axis(self.point.x, self.normal.x, cell),
                select_axis(self.point.y, self.normal.y, cell),
                select_axis(self.point.z, self.normal.z, cell),
            ),
        }
    }

    /// Resolves the hit and checks the result against the chunk that was hit.
    ///
    /// The hit block must lie in [`RaycastHit::chunk`]. The cell in front of
    /// it may also lie in one of that chunk's six face neighbours.
    ///
    /// # Returns
    /// `WorldError::OutOfBounds` if the resolved block is not where the hit
    /// chunk says it should be.
    pub fn resolve_in_chunk(
        &self,
        cell: TargetCell,
        resolution: TargetResolution,
        chunk_size: u32,
    ) -> Result<Point3<i32>, WorldError> {
        let block = self.resolve(cell, resolution);
        let owner = ChunkCoordinate::from_block(block, chunk_size);
        let distance = [
            (owner.x, self.chunk.x),
            (owner.y, self.chunk.y),
            (owner.z, self.chunk.z),
        ]
        .iter()
        .map(|&(a, b)| (i64::from(a) - i64::from(b)).abs())
        .sum::<i64>();

        let allowed = match cell {
            TargetCell::Hit => 0,
            TargetCell::Adjacent => 1,
        };
        if distance > allowed {
            return Err(WorldError::OutOfBounds(block));
        }
        Ok(block)
    }
}

fn select_axis(coordinate: f32, normal: f32, cell: TargetCell) -> i32 {
    let outward = match cell {
        TargetCell::Hit => false,
        TargetCell::Adjacent => true,
    };
    let resolved = if normal > AXIS_THRESHOLD {
        if outward {
            coordinate.ceil()
        } else {
            coordinate.floor()
        }
    } else if normal < -AXIS_THRESHOLD {
        if outward {
            coordinate.floor()
        } else {
            coordinate.ceil()
        }
    } else {
        coordinate.round()
    };
    resolved as i32
}
