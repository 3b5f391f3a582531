//! # Chunk Module
//!
//! This module provides the `Chunk` struct: one cubic region of the world with
//! its voxel grid, the render mesh built from it and the collision mesh baked
//! from that render mesh.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──dispatch──▶ Generating ──grid──▶ Meshing ──mesh──▶ Ready
//!    ▲                                          │
//!    └──────── task failure / mesh eviction ────┘
//! ```
//!
//! A chunk that already holds a grid (loaded from a save, or evicted from the
//! mesh residency cache) skips `Generating`. Activation is tracked separately
//! from the lifecycle: an active chunk may still be meshing.
//!
//! ## Job tickets
//!
//! Every dispatch and every edit bumps the chunk's ticket. Worker results carry
//! the ticket they were dispatched with and are dropped if it no longer
//! matches, so a late mesh can never overwrite a newer edit.

use std::time::Duration;

use cgmath::Point3;

use coordinate::ChunkCoordinate;
use settings::ChunkSettings;
use voxel_grid::VoxelGrid;

use super::block::BlockTypeSize;
use super::world::WorldError;
use crate::engine_state::rendering::{meshing::build_surface_mesh, CollisionMesh, MeshBuffers};

pub mod chunk_creation;
pub mod chunk_iteration;
pub mod coordinate;
pub mod settings;
pub mod voxel_grid;

/// Where a chunk is in its generation pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Waiting to be dispatched.
    Pending,
    /// A generation task is running.
    Generating,
    /// A mesh task is running.
    Meshing,
    /// Grid, mesh and collision are all present.
    Ready,
}

/// A cubic region of `chunk_size³` blocks.
#[derive(Debug)]
pub struct Chunk {
    coordinate: ChunkCoordinate,
    state: ChunkState,
    active: bool,
    grid: Option<VoxelGrid>,
    mesh: Option<MeshBuffers>,
    collision: Option<CollisionMesh>,
    ticket: u64,
}

impl Chunk {
    /// Creates an inactive, pending chunk with no data.
    pub fn new(coordinate: ChunkCoordinate) -> Self {
        Chunk {
            coordinate,
            state: ChunkState::Pending,
            active: false,
            grid: None,
            mesh: None,
            collision: None,
            ticket: 0,
        }
    }

    /// Creates an inactive, pending chunk that already owns its grid.
    pub fn with_grid(coordinate: ChunkCoordinate, grid: VoxelGrid) -> Self {
        Chunk {
            grid: Some(grid),
            ..Chunk::new(coordinate)
        }
    }

    /// Position on the chunk lattice.
    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }

    /// Current pipeline state.
    pub fn state(&self) -> ChunkState {
        self.state
    }

    /// Returns true while the chunk is presented.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true once mesh and collision are installed.
    pub fn is_ready(&self) -> bool {
        self.state == ChunkState::Ready
    }

    /// The voxel grid, once generated or restored.
    pub fn grid(&self) -> Option<&VoxelGrid> {
        self.grid.as_ref()
    }

    /// The surface mesh, while ready.
    pub fn mesh(&self) -> Option<&MeshBuffers> {
        self.mesh.as_ref()
    }

    /// The collision mesh, while ready.
    pub fn collision(&self) -> Option<&CollisionMesh> {
        self.collision.as_ref()
    }

    /// Ticket of the most recent dispatch or edit.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Starts a new pipeline job and returns its ticket.
    ///
    /// Chunks with a grid go straight to meshing.
    pub(crate) fn begin_job(&mut self) -> u64 {
        self.ticket += 1;
        self.state = if self.grid.is_some() {
            ChunkState::Meshing
        } else {
            ChunkState::Generating
        };
        self.ticket
    }

    /// Installs a generated grid and moves on to meshing.
    pub(crate) fn install_grid(&mut self, grid: VoxelGrid) {
        self.grid = Some(grid);
        self.state = ChunkState::Meshing;
    }

    /// Installs a mesh and its collision, marking the chunk ready.
    pub(crate) fn install_mesh(&mut self, mesh: MeshBuffers, collision: CollisionMesh) {
        self.mesh = Some(mesh);
        self.collision = Some(collision);
        self.state = ChunkState::Ready;
    }

    /// Drops the current job after a worker failure.
    pub(crate) fn fail_job(&mut self) {
        self.state = ChunkState::Pending;
    }

    /// Releases mesh and collision. The grid is kept, so the chunk only needs
    /// remeshing when it is dispatched again.
    pub(crate) fn evict_mesh(&mut self) {
        self.mesh = None;
        self.collision = None;
        self.state = ChunkState::Pending;
    }

    /// Rebuilds the mesh and collision from the current grid, synchronously.
    ///
    /// # Returns
    /// `WorldError::ChunkNotReady` if the chunk has no grid yet.
    pub fn rebuild(&mut self, settings: &ChunkSettings) -> Result<(), WorldError> {
        let grid = self
            .grid
            .as_ref()
            .ok_or(WorldError::ChunkNotReady(self.coordinate))?;
        let mesh = build_surface_mesh(grid, settings);
        let collision = CollisionMesh::bake(&mesh, self.coordinate.origin(settings.chunk_size));
        self.install_mesh(mesh, collision);
        Ok(())
    }

    /// Overwrites one block and rebuilds the whole chunk mesh.
    ///
    /// The ticket is bumped first, so any mesh still being built for the old
    /// grid is discarded when it arrives.
    ///
    /// # Arguments
    /// * `world_block` - Integer world position of the block
    /// * `block_type` - New block type, [`AIR`](super::block::block_type::AIR) to remove
    /// * `settings` - Shared chunk settings
    ///
    /// # Returns
    /// The previous block type.
    pub fn set_block(
        &mut self,
        world_block: Point3<i32>,
        block_type: BlockTypeSize,
        settings: &ChunkSettings,
    ) -> Result<BlockTypeSize, WorldError> {
        if !settings.is_known_type(block_type) {
            return Err(WorldError::InvalidBlockType(block_type));
        }
        let cell = self
            .coordinate
            .local_cell(world_block, settings.chunk_size)
            .ok_or(WorldError::OutOfBounds(world_block))?;
        let grid = self
            .grid
            .as_mut()
            .ok_or(WorldError::ChunkNotReady(self.coordinate))?;

        let previous = grid.set(cell, block_type);
        self.ticket += 1;
        self.rebuild(settings)?;
        Ok(previous)
    }

    /// Block type at a world position, `None` if the block is not in this
    /// chunk or the grid does not exist yet.
    pub fn block_at(&self, world_block: Point3<i32>, chunk_size: u32) -> Option<BlockTypeSize> {
        let cell = self.coordinate.local_cell(world_block, chunk_size)?;
        self.grid.as_ref().map(|grid| grid.get(cell))
    }

    /// How long the block at `world_block` takes to destroy, `None` for air,
    /// unknown blocks or chunks without data.
    pub fn destroy_duration(&self, world_block: Point3<i32>, settings: &ChunkSettings) -> Option<Duration> {
        let block_type = self.block_at(world_block, settings.chunk_size)?;
        settings
            .palette_entry(block_type)
            .map(|entry| entry.destroy_duration())
    }
}
