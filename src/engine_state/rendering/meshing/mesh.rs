//! Mesh data structures produced by the surface mesher.
//!
//! A [`MeshBuffers`] holds four parallel attribute streams for one chunk. The
//! triangle list indexes into the vertex streams; positions are relative to the
//! chunk origin.

use cgmath::{Point3, Vector3};

use crate::engine_state::{rendering::Vertex, voxels::block::Color};

use super::BlockTemplate;

/// Geometry for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    /// Chunk-local vertex positions
    pub vertices: Vec<Point3<f32>>,
    /// Per-vertex normals, same length as `vertices`
    pub normals: Vec<Vector3<f32>>,
    /// Triangle list, three indices per triangle
    pub triangles: Vec<u32>,
    /// Per-vertex colors, same length as `vertices`
    pub colors: Vec<Color>,
}

impl MeshBuffers {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the mesh has no geometry.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Appends a copy of `template` translated by `offset`, colored `color`.
    ///
    /// The template's indices are shifted by the number of vertices already in
    /// the buffers.
    pub fn append_block(&mut self, template: &BlockTemplate, offset: Vector3<f32>, color: Color) {
        let base = self.vertices.len() as u32;

        self.vertices
            .extend(template.vertices.iter().map(|vertex| vertex + offset));
        self.normals.extend_from_slice(&template.normals);
        self.colors
            .extend(std::iter::repeat(color).take(template.vertices.len()));
        self.triangles
            .extend(template.triangles.iter().map(|index| index + base));
    }

    /// Interleaves the attribute streams into GPU-ready vertices.
    pub fn interleaved(&self) -> Vec<Vertex> {
        self.vertices
            .iter()
            .zip(&self.normals)
            .zip(&self.colors)
            .map(|((position, normal), color)| Vertex::new(*position, *normal, *color))
            .collect()
    }
}
