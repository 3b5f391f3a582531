//! # Block Side Module
//!
//! The six faces of a unit block. Used for neighbour lookups during face-exposure
//! culling and to lay out the unit-block geometry template.

use cgmath::{Point3, Vector3};

/// Represents the six possible faces of a voxel block.
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Offset to the cell that shares this face.
    pub fn neighbor_offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// Outward unit normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        let offset = self.neighbor_offset();
        Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32)
    }

    /// Corners of this face on a unit block centred at the origin.
    ///
    /// The corners wind counter-clockwise when seen from outside the block, so
    /// the triangles `(0, 1, 2)` and `(0, 2, 3)` face along [`Self::normal`].
    pub fn corners(self) -> [Point3<f32>; 4] {
        const H: f32 = 0.5;
        match self {
            BlockSide::FRONT => [
                Point3::new(-H, -H, H),
                Point3::new(H, -H, H),
                Point3::new(H, H, H),
                Point3::new(-H, H, H),
            ],
            BlockSide::BACK => [
                Point3::new(H, -H, -H),
                Point3::new(-H, -H, -H),
                Point3::new(-H, H, -H),
                Point3::new(H, H, -H),
            ],
            BlockSide::BOTTOM => [
                Point3::new(-H, -H, -H),
                Point3::new(H, -H, -H),
                Point3::new(H, -H, H),
                Point3::new(-H, -H, H),
            ],
            BlockSide::TOP => [
                Point3::new(-H, H, -H),
                Point3::new(-H, H, H),
                Point3::new(H, H, H),
                Point3::new(H, H, -H),
            ],
            BlockSide::LEFT => [
                Point3::new(-H, -H, H),
                Point3::new(-H, H, H),
                Point3::new(-H, H, -H),
                Point3::new(-H, -H, -H),
            ],
            BlockSide::RIGHT => [
                Point3::new(H, -H, -H),
                Point3::new(H, H, -H),
                Point3::new(H, H, H),
                Point3::new(H, -H, H),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn corners_wind_along_normal() {
        for side in BlockSide::all() {
            let [a, b, c, _] = side.corners();
            let winding = (b - a).cross(c - a).normalize();
            assert!((winding - side.normal()).magnitude() < 1e-6, "{side:?}");
        }
    }

    #[test]
    fn opposite_faces_cancel() {
        let sum = BlockSide::all()
            .iter()
            .fold(Vector3::new(0, 0, 0), |acc, side| acc + side.neighbor_offset());
        assert_eq!(sum, Vector3::new(0, 0, 0));
    }
}
