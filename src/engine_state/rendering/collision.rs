//! Collision geometry baked from chunk meshes.
//!
//! Physics backends receive the same triangles the renderer draws, but already
//! placed in world space and with an axis-aligned bounding box for broad-phase
//! rejection. Baking is pure and runs on workers next to the mesher.

use cgmath::{Point3, Vector3};

use super::meshing::MeshBuffers;

/// World-space triangle soup for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionMesh {
    triangles: Vec<[Point3<f32>; 3]>,
    bounds: Option<(Point3<f32>, Point3<f32>)>,
}

impl CollisionMesh {
    /// Bakes collision triangles from mesh buffers.
    ///
    /// # Arguments
    /// * `mesh` - Chunk-local render mesh
    /// * `origin` - World block of the chunk's local cell `(0, 0, 0)`
    pub fn bake(mesh: &MeshBuffers, origin: Point3<i32>) -> Self {
        let offset = Vector3::new(origin.x as f32, origin.y as f32, origin.z as f32);

        let triangles: Vec<[Point3<f32>; 3]> = mesh
            .triangles
            .chunks_exact(3)
            .filter_map(|indices| {
                let a = mesh.vertices.get(indices[0] as usize)?;
                let b = mesh.vertices.get(indices[1] as usize)?;
                let c = mesh.vertices.get(indices[2] as usize)?;
                Some([a + offset, b + offset, c + offset])
            })
            .collect();

        let bounds = triangles.iter().flatten().fold(None, |bounds, p| match bounds {
            None => Some((*p, *p)),
            Some((min, max)) => Some((
                Point3::new(p.x.min(min.x), p.y.min(min.y), p.z.min(min.z)),
                Point3::new(p.x.max(max.x), p.y.max(max.y), p.z.max(max.z)),
            )),
        });

        CollisionMesh { triangles, bounds }
    }

    /// World-space triangles.
    pub fn triangles(&self) -> &[[Point3<f32>; 3]] {
        &self.triangles
    }

    /// Returns true if there is nothing to collide with.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Minimum and maximum corner of the bounding box, `None` when empty.
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::meshing::{BlockTemplate, MeshBuffers};
    use crate::engine_state::voxels::block::Color;

    #[test]
    fn bakes_into_world_space() {
        let mut mesh = MeshBuffers::new();
        mesh.append_block(
            BlockTemplate::unit(),
            Vector3::new(1.0, 0.0, 0.0),
            Color::rgb(0, 0, 0),
        );

        let collision = CollisionMesh::bake(&mesh, Point3::new(16, -16, 0));
        assert_eq!(collision.triangles().len(), 12);
        assert_eq!(
            collision.bounds(),
            Some((Point3::new(16.5, -16.5, -0.5), Point3::new(17.5, -15.5, 0.5)))
        );
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        let collision = CollisionMesh::bake(&MeshBuffers::new(), Point3::new(0, 0, 0));
        assert!(collision.is_empty());
        assert_eq!(collision.bounds(), None);
    }
}
