//! Surface mesh generation for voxel chunks.
//!
//! The mesher turns a chunk's voxel grid into a triangle mesh by stamping a
//! unit-block template at every solid cell that is visible. A cell counts as
//! visible when face optimization is disabled, or when at least one of its six
//! face neighbours is empty or lies outside the chunk. Hidden interior blocks
//! are skipped entirely; visible blocks contribute all six faces.
//!
//! # Architecture
//! - [`BlockTemplate`]: the 24-vertex, 36-index unit cube shared by every block
//! - [`MeshBuffers`]: the per-chunk output streams
//! - [`build_surface_mesh`]: the pure grid to mesh conversion
//!
//! Neighbouring chunks are never consulted, so every chunk can be meshed
//! independently on a worker thread. Faces on chunk borders are always kept.

use std::sync::OnceLock;

use cgmath::{Point3, Vector3};

use crate::engine_state::voxels::{
    block::{block_side::BlockSide, Color},
    chunk::{chunk_iteration::GridBlockIterator, settings::ChunkSettings, voxel_grid::VoxelGrid},
};

mod mesh;

pub use mesh::MeshBuffers;

/// Color used for block types that have no palette entry.
pub const MISSING_TYPE_COLOR: Color = Color::rgb(255, 0, 255);

/// Geometry of a single unit block centred on the origin.
///
/// Each face has its own four vertices so normals stay flat. Faces appear in
/// [`BlockSide::all`] order.
#[derive(Debug)]
pub struct BlockTemplate {
    /// Face corners, four per face
    pub vertices: [Point3<f32>; 24],
    /// Face normals, repeated for each corner
    pub normals: [Vector3<f32>; 24],
    /// Two counter-clockwise triangles per face
    pub triangles: [u32; 36],
}

impl BlockTemplate {
    fn build() -> Self {
        let mut vertices = [Point3::new(0.0, 0.0, 0.0); 24];
        let mut normals = [Vector3::new(0.0, 0.0, 0.0); 24];
        let mut triangles = [0u32; 36];

        for (face, side) in BlockSide::all().into_iter().enumerate() {
            let first = face * 4;
            for (corner, position) in side.corners().into_iter().enumerate() {
                vertices[first + corner] = position;
                normals[first + corner] = side.normal();
            }
            let base = first as u32;
            triangles[face * 6..face * 6 + 6]
                .copy_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        BlockTemplate {
            vertices,
            normals,
            triangles,
        }
    }

    /// The shared unit-block template.
    pub fn unit() -> &'static BlockTemplate {
        static TEMPLATE: OnceLock<BlockTemplate> = OnceLock::new();
        TEMPLATE.get_or_init(BlockTemplate::build)
    }
}

/// Returns true if any face neighbour of `cell` is empty or outside the grid.
fn is_exposed(grid: &VoxelGrid, cell: Point3<usize>) -> bool {
    let cell = Point3::new(cell.x as i32, cell.y as i32, cell.z as i32);
    BlockSide::all()
        .into_iter()
        .any(|side| !grid.is_solid_at(cell + side.neighbor_offset()))
}

/// Builds the surface mesh of a chunk grid.
///
/// Solid cells are visited in canonical order. For every cell that passes the
/// exposure test the whole unit-block template is appended, translated by the
/// cell's local coordinate and colored with the block type's palette color.
///
/// # Arguments
/// * `grid` - The chunk's voxel grid
/// * `settings` - Palette and face optimization flag
///
/// # Returns
/// Chunk-local mesh buffers. Empty if the grid holds no visible blocks.
pub fn build_surface_mesh(grid: &VoxelGrid, settings: &ChunkSettings) -> MeshBuffers {
    let template = BlockTemplate::unit();
    let mut mesh = MeshBuffers::new();

    for (cell, block_type) in GridBlockIterator::new(grid) {
        if settings.optimize_faces && !is_exposed(grid, cell) {
            continue;
        }

        let color = settings
            .palette_entry(block_type)
            .map(|entry| entry.color)
            .unwrap_or(MISSING_TYPE_COLOR);
        let offset = Vector3::new(cell.x as f32, cell.y as f32, cell.z as f32);
        mesh.append_block(template, offset, color);
    }

    mesh
}
