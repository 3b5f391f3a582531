//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: Builds the surface mesh and collision for a chunk

pub mod chunk_mesh_generation_task;
