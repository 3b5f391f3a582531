//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask`, which samples the density
//! field for one chunk on a worker thread. Its result installs the grid and
//! schedules the mesh task for the same chunk.

use std::sync::Arc;

use crate::engine_state::{
    task_management::task::{Task, TaskResult},
    voxels::{
        chunk::{chunk_creation, voxel_grid::VoxelGrid},
        density::DensityField,
        world::{JobTicket, World},
    },
};

/// A task that generates chunk data asynchronously.
///
/// This task is responsible for:
/// 1. Sampling the density field for every cell of the chunk
/// 2. Handing the grid back to the world
/// 3. Scheduling mesh generation for the chunk
pub struct ChunkGenerationTask {
    /// Identifies the chunk and the dispatch this task belongs to
    job: JobTicket,
    /// Shared, immutable density field
    field: Arc<DensityField>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `job` - Chunk coordinate, world epoch and chunk ticket at dispatch
    /// * `field` - Density field of the current world seed
    pub fn new(job: JobTicket, field: Arc<DensityField>) -> Self {
        ChunkGenerationTask { job, field }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let origin = self.job.coordinate.origin(self.field.settings().chunk_size);
        let grid = chunk_creation::generate(origin, &self.field);

        Box::new(ChunkGenerationTaskResult {
            job: self.job,
            grid: Some(grid),
        })
    }

    fn abandon(&self) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            job: self.job,
            grid: None,
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    job: JobTicket,
    /// The generated grid, `None` if generation panicked
    grid: Option<VoxelGrid>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Installs the grid and returns the follow-up mesh task, if the job is
    /// still current.
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>> {
        match self.grid {
            Some(grid) => world
                .apply_generated_grid(self.job, grid)
                .into_iter()
                .collect(),
            None => {
                world.abandon_job(self.job);
                Vec::new()
            }
        }
    }
}
