//! Task for generating mesh data for chunks in a background thread.
//!
//! The task runs the surface mesher over a copy of the chunk grid and bakes the
//! collision mesh from the result, so neither step touches the orchestrating
//! thread.

use std::sync::Arc;

use crate::engine_state::{
    rendering::{meshing::build_surface_mesh, CollisionMesh, MeshBuffers},
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{settings::ChunkSettings, voxel_grid::VoxelGrid},
        world::{JobTicket, World},
    },
};

/// A task that builds render and collision geometry for a chunk.
pub struct ChunkMeshGenerationTask {
    /// Identifies the chunk and the dispatch this task belongs to
    job: JobTicket,
    /// Snapshot of the chunk grid at dispatch time
    grid: VoxelGrid,
    /// Palette and face optimization flag
    settings: Arc<ChunkSettings>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `job` - Chunk coordinate, world epoch and chunk ticket at dispatch
    /// * `grid` - Copy of the chunk's grid
    /// * `settings` - Shared chunk settings
    pub fn new(job: JobTicket, grid: VoxelGrid, settings: Arc<ChunkSettings>) -> Self {
        ChunkMeshGenerationTask {
            job,
            grid,
            settings,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let mesh = build_surface_mesh(&self.grid, &self.settings);
        let collision =
            CollisionMesh::bake(&mesh, self.job.coordinate.origin(self.settings.chunk_size));

        Box::new(ChunkMeshGenerationTaskResult {
            job: self.job,
            geometry: Some((mesh, collision)),
        })
    }

    fn abandon(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkMeshGenerationTaskResult {
            job: self.job,
            geometry: None,
        })
    }
}

/// The result of a chunk mesh generation task.
pub struct ChunkMeshGenerationTaskResult {
    job: JobTicket,
    /// Render mesh and collision, `None` if meshing panicked
    geometry: Option<(MeshBuffers, CollisionMesh)>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>> {
        match self.geometry {
            Some((mesh, collision)) => world.apply_mesh(self.job, mesh, collision),
            None => world.abandon_job(self.job),
        }
        Vec::new()
    }
}
