//! Vertex data structures for handing chunk meshes to a rendering backend.
//!
//! Chunk meshes are stored as separate attribute streams (see
//! [`MeshBuffers`](super::meshing::MeshBuffers)); backends that upload to a GPU
//! usually want them interleaved. [`Vertex`] is that interleaved form.

use cgmath::{Point3, Vector3};

use crate::engine_state::voxels::block::Color;

/// A single interleaved mesh vertex.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Normal: 3x f32 (12 bytes)
/// - Color: 4x u8 (4 bytes)
///
/// Total size: 28 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Chunk-local position
    pub position: [f32; 3],
    /// Flat face normal
    pub normal: [f32; 3],
    /// RGBA vertex color
    pub color: [u8; 4],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - Position relative to the chunk origin
    /// * `normal` - Unit normal of the face the vertex belongs to
    /// * `color` - Palette color of the block
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, color: Color) -> Self {
        Vertex {
            position: [position.x, position.y, position.z],
            normal: [normal.x, normal.y, normal.z],
            color: [color.r, color.g, color.b, color.a],
        }
    }
}
