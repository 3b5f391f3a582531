//! # Voxel Task System
//!
//! Tasks that produce voxel data off the orchestrating thread. Generation
//! results chain into mesh tasks from the rendering module.

pub mod chunk_generation_task;
