//! # Voxel Terrain Core
//!
//! This module contains the data side of the terrain: what a block is, how
//! chunks store them, how terrain is generated and how the world streams
//! chunks around the observer.
//!
//! ## Architecture
//!
//! * **Block**: Block type identifiers, the palette and cube faces
//! * **Chunk**: Fixed-size cubic grids of blocks and their pipeline state
//! * **Density**: The seeded noise field deciding what is solid
//! * **World**: Owns every chunk and reconciles them against the view window
//! * **Targeting**: Turns raycast hits into block coordinates
//! * **Tasks**: Generation work handed to the worker pool
//!
//! ## Data Flow
//!
//! 1. The world computes the desired chunk set around the observer
//! 2. Missing chunks are generated on the workers
//! 3. Generated grids are meshed on the workers
//! 4. Finished chunks are activated a few per tick and handed to the presenter
//!
//! ## Thread Safety
//!
//! Chunks are only touched by the thread that owns the `World`. Workers receive
//! copies of grids and shared immutable settings, and their results are
//! checked against the chunk's current job before being applied.

pub mod block;
pub mod chunk;
pub mod density;
pub mod targeting;
pub mod tasks;
pub mod world;
