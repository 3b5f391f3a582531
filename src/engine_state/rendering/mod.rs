//! Geometry production and the seam to presentation backends.
//!
//! This module turns voxel grids into render and collision geometry and defines
//! how finished chunks are handed to whatever draws them. The core never draws
//! anything itself: the world queues [`PresentationUpdate`]s, and the engine
//! forwards them to a [`ChunkPresenter`] once per tick.

use std::collections::HashMap;

use crate::engine_state::voxels::chunk::coordinate::ChunkCoordinate;

pub mod collision;
pub mod meshing;
pub mod tasks;
mod vertex;

// Re-export commonly used types
pub use collision::CollisionMesh;
pub use meshing::MeshBuffers;
pub use vertex::Vertex;

/// A change in which chunks should be visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentationUpdate {
    /// The chunk is active and has a new or updated mesh.
    Show(ChunkCoordinate),
    /// The chunk left the active set.
    Hide(ChunkCoordinate),
    /// The world was reset; drop everything.
    Clear,
}

/// A backend that draws chunk meshes and resolves collisions against them.
pub trait ChunkPresenter {
    /// Shows a chunk, replacing any geometry previously shown for it.
    fn present(&mut self, coordinate: ChunkCoordinate, mesh: &MeshBuffers, collision: &CollisionMesh);

    /// Hides a chunk. Its data stays in the world.
    fn withdraw(&mut self, coordinate: ChunkCoordinate);

    /// Hides every chunk.
    fn clear(&mut self);
}

/// Presenter that only keeps track of what would be on screen.
///
/// Used by the headless driver and in tests.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    visible: HashMap<ChunkCoordinate, usize>,
    presented: usize,
}

impl HeadlessPresenter {
    /// Creates a presenter with nothing visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently shown.
    pub fn visible_chunks(&self) -> usize {
        self.visible.len()
    }

    /// Total triangles across shown chunks.
    pub fn visible_triangles(&self) -> usize {
        self.visible.values().sum()
    }

    /// Returns true if the chunk is currently shown.
    pub fn is_visible(&self, coordinate: ChunkCoordinate) -> bool {
        self.visible.contains_key(&coordinate)
    }

    /// Number of `present` calls so far.
    pub fn presented(&self) -> usize {
        self.presented
    }
}

impl ChunkPresenter for HeadlessPresenter {
    fn present(&mut self, coordinate: ChunkCoordinate, mesh: &MeshBuffers, _collision: &CollisionMesh) {
        self.presented += 1;
        self.visible.insert(coordinate, mesh.triangle_count());
    }

    fn withdraw(&mut self, coordinate: ChunkCoordinate) {
        self.visible.remove(&coordinate);
    }

    fn clear(&mut self) {
        self.visible.clear();
    }
}
