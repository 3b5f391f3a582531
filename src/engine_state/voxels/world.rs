//! # World Module
//!
//! This module provides the `World` struct, which owns every chunk and streams
//! them in and out around a moving observer.
//!
//! ## Streaming
//!
//! Each tick the world computes the set of chunk coordinates that should be
//! visible: a horizontal disk of radius `view_distance` around the observer's
//! chunk, `layer_count` chunks tall starting at chunk `y = 0`. It then
//! reconciles that set against what it has:
//!
//! - desired but missing chunks are created and their pipeline is started
//! - desired but inactive chunks are queued for activation (at most once)
//! - active chunks that are no longer desired are deactivated
//!
//! Deactivated chunks keep their data. The world never frees a chunk except on
//! a full reset (load). The activation queue drains a fixed number of chunks
//! per tick to spread the cost of new geometry over several frames.
//!
//! ## Pipeline
//!
//! Generation and meshing run on the `TaskManager`. Every job carries a
//! [`JobTicket`]: the world epoch (bumped by reset) and the chunk's ticket
//! (bumped by every dispatch and edit). Results whose ticket is out of date are
//! dropped on arrival.
//!
//! ## Mesh Residency
//!
//! Inactive chunks keep their meshes in an LRU of `inactive_mesh_budget`
//! entries. Chunks pushed out of it drop mesh and collision, keep their grid,
//! and are remeshed if they are needed again. Chunks waiting in the activation
//! queue are never in the LRU, so a small budget cannot evict a mesh that is
//! about to be shown.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::{debug, info, trace, warn};
use lru::LruCache;
use thiserror::Error;
use web_time::Instant;

use super::{
    block::{
        block_type::{self, AIR},
        BlockTypeSize,
    },
    chunk::{
        coordinate::ChunkCoordinate, settings::ChunkSettings, voxel_grid::VoxelGrid, Chunk,
        ChunkState,
    },
    density::DensityField,
    tasks::chunk_generation_task::ChunkGenerationTask,
};
use crate::engine_state::{
    config::StreamSettings,
    rendering::{
        tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask, CollisionMesh, MeshBuffers,
        PresentationUpdate,
    },
    task_management::{
        task::{Task, TaskResult},
        TaskManager,
    },
};

/// Ticks slower than this are logged.
const SLOW_TICK: Duration = Duration::from_millis(16);

/// Errors returned by world edits.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// Edits need an active chunk
    #[error("chunk {0:?} is not active")]
    InactiveChunk(ChunkCoordinate),
    /// The chunk has not been generated
    #[error("chunk {0:?} has no voxel data yet")]
    ChunkNotReady(ChunkCoordinate),
    /// Only palette entries can be placed
    #[error("block type {0} is not a placeable palette entry")]
    InvalidBlockType(BlockTypeSize),
    /// The block is not in the chunk it was looked up in
    #[error("block {0:?} lies outside the chunk")]
    OutOfBounds(Point3<i32>),
}

/// Identifies one pipeline job for one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobTicket {
    /// Chunk the job works on
    pub coordinate: ChunkCoordinate,
    /// World epoch at dispatch
    pub epoch: u64,
    /// Chunk ticket at dispatch
    pub ticket: u64,
}

/// Streams chunks around the observer and owns all chunk data.
pub struct World {
    settings: Arc<ChunkSettings>,
    stream: StreamSettings,
    seed: i32,
    field: Arc<DensityField>,
    /// Bumped on every reset; results from older epochs are stale
    epoch: u64,
    all_chunks: HashMap<ChunkCoordinate, Chunk>,
    /// Subset of `all_chunks` currently presented
    active_chunks: HashSet<ChunkCoordinate>,
    pending_activation: VecDeque<ChunkCoordinate>,
    /// Membership of `pending_activation`
    queued_for_activation: HashSet<ChunkCoordinate>,
    desired: HashSet<ChunkCoordinate>,
    center: Option<ChunkCoordinate>,
    /// Inactive chunks that still hold a mesh and are not waiting for
    /// activation, least recently deactivated first
    resident_meshes: LruCache<ChunkCoordinate, ()>,
    task_manager: TaskManager,
    updates: Vec<PresentationUpdate>,
    stale_results: u64,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `settings` - Validated chunk settings
    /// * `stream` - Validated streaming settings, fixed for the world's lifetime
    /// * `worker_threads` - Worker pool size, `0` runs tasks inline
    /// * `seed` - Generation seed
    pub fn new(
        settings: Arc<ChunkSettings>,
        stream: StreamSettings,
        worker_threads: usize,
        seed: i32,
    ) -> Self {
        info!(
            "Creating world: seed {seed}, chunk size {}, view distance {}, {} layers",
            settings.chunk_size, stream.view_distance, stream.layer_count
        );

        World {
            field: Arc::new(DensityField::new(seed, settings.clone())),
            settings,
            stream,
            seed,
            epoch: 0,
            all_chunks: HashMap::new(),
            active_chunks: HashSet::new(),
            pending_activation: VecDeque::new(),
            queued_for_activation: HashSet::new(),
            desired: HashSet::new(),
            center: None,
            resident_meshes: LruCache::unbounded(),
            task_manager: TaskManager::new(worker_threads),
            updates: Vec::new(),
            stale_results: 0,
        }
    }

    /// Chunk settings shared with the workers.
    pub fn settings(&self) -> &Arc<ChunkSettings> {
        &self.settings
    }

    /// Streaming settings fixed at construction.
    pub fn stream_settings(&self) -> &StreamSettings {
        &self.stream
    }

    /// Generation seed.
    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Number of resets so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The chunk at `coordinate`, if held.
    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.all_chunks.get(&coordinate)
    }

    /// Number of chunks held, active or not.
    pub fn all_chunk_count(&self) -> usize {
        self.all_chunks.len()
    }

    /// Coordinates of the presented chunks.
    pub fn active_chunks(&self) -> &HashSet<ChunkCoordinate> {
        &self.active_chunks
    }

    /// Returns true if the chunk at `coordinate` is presented.
    pub fn is_active(&self, coordinate: ChunkCoordinate) -> bool {
        self.active_chunks.contains(&coordinate)
    }

    /// Chunks waiting to be activated.
    pub fn pending_activation_count(&self) -> usize {
        self.pending_activation.len()
    }

    /// Worker results dropped because their job was superseded.
    pub fn stale_results(&self) -> u64 {
        self.stale_results
    }

    /// The coordinates that should be active around `center`.
    ///
    /// For every `z` in `[-vd, vd]` the row spans `x` in `[-w, w]` with
    /// `w = floor(sqrt(vd² - z²))`, and every row is `layer_count` chunks tall.
    /// Coordinates whose blocks would leave the `i32` block space are skipped.
    pub fn desired_coordinates(&self, center: ChunkCoordinate) -> Vec<ChunkCoordinate> {
        let vd = self.stream.view_distance as i32;
        let layers = i32::try_from(self.stream.layer_count).unwrap_or(i32::MAX);
        let mut coordinates = Vec::new();

        for z in -vd..=vd {
            let Some(cz) = center.z.checked_add(z) else {
                continue;
            };
            let w = ((vd * vd - z * z) as f64).sqrt().floor() as i32;
            for x in -w..=w {
                let Some(cx) = center.x.checked_add(x) else {
                    continue;
                };
                for y in 0..layers {
                    let coordinate = ChunkCoordinate::new(cx, y, cz);
                    if coordinate.is_addressable(self.settings.chunk_size) {
                        coordinates.push(coordinate);
                    }
                }
            }
        }

        coordinates
    }

    /// Advances streaming by one frame.
    ///
    /// Applies finished worker results, reconciles the chunk set against the
    /// observer's position, activates queued chunks and hands queued tasks to
    /// the workers.
    ///
    /// # Arguments
    /// * `view_center` - Observer position in world space
    pub fn tick(&mut self, view_center: Point3<f32>) {
        let started = Instant::now();

        self.apply_completed_tasks();

        let center = ChunkCoordinate::from_world_position(view_center, self.settings.chunk_size);
        self.reconcile(center);
        self.drain_activations();
        self.task_manager.process_queued_tasks();

        let elapsed = started.elapsed();
        if elapsed > SLOW_TICK {
            debug!(
                "Slow tick: {elapsed:?}, {} chunks, {} active, {} queued",
                self.all_chunks.len(),
                self.active_chunks.len(),
                self.pending_activation.len()
            );
        }
    }

    /// True once nothing waits for activation and every active chunk is ready.
    pub fn is_world_settled(&self) -> bool {
        self.pending_activation.is_empty()
            && self
                .active_chunks
                .iter()
                .all(|c| self.all_chunks.get(c).is_some_and(Chunk::is_ready))
    }

    /// Blocks until every dispatched job and its follow-ups have been applied.
    pub fn finish_pending_work(&mut self) {
        while !self.task_manager.is_idle() {
            let results = self.task_manager.wait_for_completed_tasks();
            self.apply_results(results);
        }
    }

    /// Takes the presentation changes queued since the last call.
    pub fn drain_presentation_updates(&mut self) -> Vec<PresentationUpdate> {
        std::mem::take(&mut self.updates)
    }

    /// Places a block.
    ///
    /// # Errors
    /// - `InvalidBlockType` for air or types outside the palette
    /// - `InactiveChunk` if the owning chunk is not active
    /// - `ChunkNotReady` if the owning chunk has not been generated yet
    pub fn create_block(
        &mut self,
        world_block: Point3<i32>,
        block_type: BlockTypeSize,
    ) -> Result<(), WorldError> {
        if !block_type::is_solid(block_type) || !self.settings.is_known_type(block_type) {
            return Err(WorldError::InvalidBlockType(block_type));
        }
        self.set_block(world_block, block_type)
    }

    /// Removes a block, leaving air.
    pub fn remove_block(&mut self, world_block: Point3<i32>) -> Result<(), WorldError> {
        self.set_block(world_block, AIR)
    }

    /// Overwrites a block with any palette type or air.
    pub fn set_block(
        &mut self,
        world_block: Point3<i32>,
        block_type: BlockTypeSize,
    ) -> Result<(), WorldError> {
        let coordinate = ChunkCoordinate::from_block(world_block, self.settings.chunk_size);
        if !self.active_chunks.contains(&coordinate) {
            return Err(WorldError::InactiveChunk(coordinate));
        }
        let chunk = self
            .all_chunks
            .get_mut(&coordinate)
            .ok_or(WorldError::InactiveChunk(coordinate))?;

        let previous = chunk.set_block(world_block, block_type, &self.settings)?;
        trace!("Block {world_block:?}: {previous} -> {block_type}");
        self.updates.push(PresentationUpdate::Show(coordinate));
        Ok(())
    }

    /// Block type at a world position, `None` if its chunk has no data.
    pub fn block_at(&self, world_block: Point3<i32>) -> Option<BlockTypeSize> {
        let coordinate = ChunkCoordinate::from_block(world_block, self.settings.chunk_size);
        self.all_chunks
            .get(&coordinate)?
            .block_at(world_block, self.settings.chunk_size)
    }

    /// How long the block at a world position takes to destroy.
    pub fn destroy_duration(&self, world_block: Point3<i32>) -> Option<Duration> {
        let coordinate = ChunkCoordinate::from_block(world_block, self.settings.chunk_size);
        self.all_chunks
            .get(&coordinate)?
            .destroy_duration(world_block, &self.settings)
    }

    /// Copies every chunk that holds a grid, ordered by coordinate.
    pub fn capture_chunks(&self) -> Vec<(ChunkCoordinate, VoxelGrid)> {
        let mut chunks: Vec<_> = self
            .all_chunks
            .values()
            .filter_map(|chunk| chunk.grid().map(|grid| (chunk.coordinate(), grid.clone())))
            .collect();
        chunks.sort_by_key(|(coordinate, _)| *coordinate);
        chunks
    }

    /// Replaces the whole world.
    ///
    /// Every existing chunk is discarded and every in-flight job becomes stale.
    /// The given grids become chunks that go straight to meshing, then
    /// streaming is reconciled around `view_center`.
    pub fn restore(
        &mut self,
        seed: i32,
        chunks: Vec<(ChunkCoordinate, VoxelGrid)>,
        view_center: Point3<f32>,
    ) {
        self.epoch += 1;
        self.task_manager.discard_queued_tasks();

        self.all_chunks.clear();
        self.active_chunks.clear();
        self.pending_activation.clear();
        self.queued_for_activation.clear();
        self.desired.clear();
        self.resident_meshes.clear();
        self.center = None;
        self.updates.clear();
        self.updates.push(PresentationUpdate::Clear);

        self.seed = seed;
        self.field = Arc::new(DensityField::new(seed, self.settings.clone()));

        let restored = chunks.len();
        for (coordinate, grid) in chunks {
            self.all_chunks
                .insert(coordinate, Chunk::with_grid(coordinate, grid));
            self.dispatch(coordinate);
        }

        let center = ChunkCoordinate::from_world_position(view_center, self.settings.chunk_size);
        self.reconcile(center);

        info!(
            "Restored world: seed {seed}, {restored} chunks, epoch {}",
            self.epoch
        );
    }

    fn apply_completed_tasks(&mut self) {
        let results = self.task_manager.process_completed_tasks();
        self.apply_results(results);
    }

    fn apply_results(&mut self, results: Vec<Box<dyn TaskResult + Send>>) {
        for result in results {
            for task in result.handle_result(self) {
                self.task_manager.publish_task(task);
            }
        }
    }

    fn reconcile(&mut self, center: ChunkCoordinate) {
        if self.center != Some(center) {
            debug!("Streaming center moved to {center:?}");
            self.center = Some(center);
        }

        let desired = self.desired_coordinates(center);
        let desired_set: HashSet<ChunkCoordinate> = desired.iter().copied().collect();

        let leaving: Vec<ChunkCoordinate> = self
            .active_chunks
            .iter()
            .filter(|c| !desired_set.contains(c))
            .copied()
            .collect();
        for coordinate in leaving {
            self.deactivate(coordinate);
        }

        let abandoned: Vec<ChunkCoordinate> = self
            .pending_activation
            .iter()
            .filter(|c| !desired_set.contains(c))
            .copied()
            .collect();
        self.pending_activation.retain(|c| desired_set.contains(c));
        self.queued_for_activation.retain(|c| desired_set.contains(c));
        for coordinate in abandoned {
            if self.all_chunks.get(&coordinate).is_some_and(Chunk::is_ready) {
                self.retain_inactive_mesh(coordinate);
            }
        }

        for coordinate in desired {
            let (pending, active) = match self.all_chunks.get(&coordinate) {
                Some(chunk) => (chunk.state() == ChunkState::Pending, chunk.is_active()),
                None => {
                    debug!("Creating chunk {coordinate:?}");
                    self.all_chunks.insert(coordinate, Chunk::new(coordinate));
                    (true, false)
                }
            };
            if pending {
                self.dispatch(coordinate);
            }
            if !active && self.queued_for_activation.insert(coordinate) {
                self.pending_activation.push_back(coordinate);
                self.resident_meshes.pop(&coordinate);
            }
        }

        self.desired = desired_set;
    }

    /// Starts the next pipeline step for a chunk: generation if it has no
    /// grid, meshing otherwise.
    fn dispatch(&mut self, coordinate: ChunkCoordinate) {
        let Some(chunk) = self.all_chunks.get_mut(&coordinate) else {
            return;
        };
        let ticket = chunk.begin_job();
        let job = JobTicket {
            coordinate,
            epoch: self.epoch,
            ticket,
        };

        let task: Box<dyn Task + Send> = match chunk.grid() {
            Some(grid) => Box::new(ChunkMeshGenerationTask::new(
                job,
                grid.clone(),
                self.settings.clone(),
            )),
            None => Box::new(ChunkGenerationTask::new(job, self.field.clone())),
        };
        trace!("Dispatching {:?} for {coordinate:?}", chunk.state());
        self.task_manager.publish_task(task);
    }

    fn drain_activations(&mut self) {
        for _ in 0..self.stream.activations_per_tick {
            let Some(coordinate) = self.pending_activation.pop_front() else {
                break;
            };
            self.queued_for_activation.remove(&coordinate);
            self.activate(coordinate);
        }
    }

    fn activate(&mut self, coordinate: ChunkCoordinate) {
        let Some(chunk) = self.all_chunks.get_mut(&coordinate) else {
            return;
        };
        chunk.set_active(true);
        self.active_chunks.insert(coordinate);
        self.resident_meshes.pop(&coordinate);
        if chunk.is_ready() {
            self.updates.push(PresentationUpdate::Show(coordinate));
        }
        debug!("Activated chunk {coordinate:?} ({:?})", chunk.state());
    }

    fn deactivate(&mut self, coordinate: ChunkCoordinate) {
        self.active_chunks.remove(&coordinate);
        let Some(chunk) = self.all_chunks.get_mut(&coordinate) else {
            return;
        };
        chunk.set_active(false);
        self.updates.push(PresentationUpdate::Hide(coordinate));
        if chunk.is_ready() {
            self.retain_inactive_mesh(coordinate);
        }
        debug!("Deactivated chunk {coordinate:?}");
    }

    fn retain_inactive_mesh(&mut self, coordinate: ChunkCoordinate) {
        self.resident_meshes.put(coordinate, ());
        while self.resident_meshes.len() > self.stream.inactive_mesh_budget {
            let Some((evicted, ())) = self.resident_meshes.pop_lru() else {
                break;
            };
            if let Some(chunk) = self.all_chunks.get_mut(&evicted) {
                chunk.evict_mesh();
                trace!("Evicted mesh of {evicted:?}");
            }
        }
    }

    /// Returns true if `job` is the chunk's current job and the chunk is in
    /// the state that job produces a result for.
    fn is_current(&self, job: JobTicket, expected: ChunkState) -> bool {
        job.epoch == self.epoch
            && self
                .all_chunks
                .get(&job.coordinate)
                .is_some_and(|chunk| chunk.ticket() == job.ticket && chunk.state() == expected)
    }

    fn discard_stale(&mut self, job: JobTicket, what: &str) {
        self.stale_results += 1;
        debug!(
            "Discarding stale {what} for {:?} (epoch {}, ticket {})",
            job.coordinate, job.epoch, job.ticket
        );
    }

    /// Installs a generated grid and returns the mesh task that continues the
    /// same job.
    pub(crate) fn apply_generated_grid(
        &mut self,
        job: JobTicket,
        grid: VoxelGrid,
    ) -> Option<Box<dyn Task + Send>> {
        if !self.is_current(job, ChunkState::Generating) {
            self.discard_stale(job, "grid");
            return None;
        }
        let chunk = self.all_chunks.get_mut(&job.coordinate)?;
        let task = ChunkMeshGenerationTask::new(job, grid.clone(), self.settings.clone());
        chunk.install_grid(grid);
        Some(Box::new(task))
    }

    /// Installs a finished mesh and its collision.
    pub(crate) fn apply_mesh(&mut self, job: JobTicket, mesh: MeshBuffers, collision: CollisionMesh) {
        if !self.is_current(job, ChunkState::Meshing) {
            self.discard_stale(job, "mesh");
            return;
        }
        let Some(chunk) = self.all_chunks.get_mut(&job.coordinate) else {
            return;
        };
        chunk.install_mesh(mesh, collision);
        if chunk.is_active() {
            self.updates.push(PresentationUpdate::Show(job.coordinate));
        } else if !self.queued_for_activation.contains(&job.coordinate) {
            self.retain_inactive_mesh(job.coordinate);
        }
    }

    /// Returns a chunk whose job failed to `Pending`. It is dispatched again
    /// by the next reconciliation that still wants it.
    pub(crate) fn abandon_job(&mut self, job: JobTicket) {
        let current = job.epoch == self.epoch
            && self
                .all_chunks
                .get(&job.coordinate)
                .is_some_and(|chunk| chunk.ticket() == job.ticket);
        if !current {
            self.discard_stale(job, "failure");
            return;
        }
        if let Some(chunk) = self.all_chunks.get_mut(&job.coordinate) {
            warn!("Job for chunk {:?} failed, will retry", job.coordinate);
            chunk.fail_job();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::chunk_creation;

    fn test_world(view_distance: u32, layer_count: u32, worker_threads: usize) -> World {
        let settings = Arc::new(ChunkSettings {
            chunk_size: 4,
            ..ChunkSettings::default()
        });
        let stream = StreamSettings {
            view_distance,
            layer_count,
            ..StreamSettings::default()
        };
        World::new(settings, stream, worker_threads, 99)
    }

    fn settle(world: &mut World, position: Point3<f32>) {
        for _ in 0..500 {
            world.tick(position);
            world.finish_pending_work();
            if world.is_world_settled() {
                return;
            }
        }
        panic!("world did not settle around {position:?}");
    }

    fn desired_set(world: &World, center: ChunkCoordinate) -> HashSet<ChunkCoordinate> {
        world.desired_coordinates(center).into_iter().collect()
    }

    #[test]
    fn view_distance_two_is_a_thirteen_chunk_disk() {
        let world = test_world(2, 1, 0);
        let desired = desired_set(&world, ChunkCoordinate::new(0, 0, 0));

        assert_eq!(desired.len(), 13);
        assert!(desired.contains(&ChunkCoordinate::new(2, 0, 0)));
        assert!(desired.contains(&ChunkCoordinate::new(0, 0, -2)));
        assert!(desired.contains(&ChunkCoordinate::new(1, 0, 1)));
        assert!(!desired.contains(&ChunkCoordinate::new(1, 0, 2)));
        assert!(!desired.contains(&ChunkCoordinate::new(2, 0, 1)));
    }

    #[test]
    fn activation_drains_one_chunk_per_tick() {
        let mut world = test_world(2, 1, 0);
        world.tick(Point3::new(0.0, 0.0, 0.0));

        assert_eq!(world.all_chunk_count(), 13);
        assert_eq!(world.active_chunks().len(), 1);
        assert_eq!(world.pending_activation_count(), 12);
        assert!(!world.is_world_settled());

        world.tick(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(world.active_chunks().len(), 2);
        assert_eq!(world.pending_activation_count(), 11);
    }

    #[test]
    fn settles_on_the_desired_disk() {
        let mut world = test_world(2, 1, 0);
        settle(&mut world, Point3::new(1.0, 30.0, 2.0));

        assert_eq!(
            world.active_chunks(),
            &desired_set(&world, ChunkCoordinate::new(0, 0, 0))
        );
        assert_eq!(world.all_chunk_count(), 13);
        for coordinate in world.active_chunks() {
            let chunk = world.chunk(*coordinate).expect("active chunk exists");
            assert!(chunk.is_ready() && chunk.is_active());
            assert!(chunk.mesh().is_some() && chunk.collision().is_some());
        }

        let shown = world
            .drain_presentation_updates()
            .into_iter()
            .filter(|u| matches!(u, PresentationUpdate::Show(_)))
            .count();
        assert!(shown >= 13);
    }

    #[test]
    fn moving_reconciles_without_freeing_chunks() {
        let mut world = test_world(2, 2, 0);
        settle(&mut world, Point3::new(0.0, 0.0, 0.0));
        let first = desired_set(&world, ChunkCoordinate::new(0, 0, 0));
        let mut seen = first.clone();
        world.drain_presentation_updates();

        for (step, x) in [12.0f32, 13.0, -20.0].into_iter().enumerate() {
            let position = Point3::new(x, 5.0, 9.0);
            let before = world.all_chunk_count();
            settle(&mut world, position);

            let center = ChunkCoordinate::from_world_position(position, 4);
            let desired = desired_set(&world, center);
            assert_eq!(world.active_chunks(), &desired, "step {step}");
            assert!(world.all_chunk_count() >= before);

            seen.extend(desired.iter().copied());
            assert_eq!(world.all_chunk_count(), seen.len());
        }

        for coordinate in first.difference(world.active_chunks()) {
            let chunk = world.chunk(*coordinate).expect("never freed");
            assert!(!chunk.is_active());
            assert!(chunk.grid().is_some());
        }
        assert!(world
            .drain_presentation_updates()
            .iter()
            .any(|u| matches!(u, PresentationUpdate::Hide(_))));
    }

    #[test]
    fn edits_round_trip_through_block_at() {
        let mut world = test_world(1, 1, 0);
        settle(&mut world, Point3::new(0.0, 0.0, 0.0));

        let block = Point3::new(1, 3, 2);
        world.create_block(block, 2).expect("chunk is active");
        assert_eq!(world.block_at(block), Some(2));
        assert_eq!(
            world.destroy_duration(block),
            Some(world.settings().block_palette[1].destroy_duration())
        );

        world.remove_block(block).expect("chunk is active");
        assert_eq!(world.block_at(block), Some(AIR));
        assert!(world.is_world_settled());
    }

    #[test]
    fn edits_outside_the_active_set_fail_loudly() {
        let mut world = test_world(1, 1, 0);
        settle(&mut world, Point3::new(0.0, 0.0, 0.0));

        let far = Point3::new(400, 1, 0);
        assert_eq!(
            world.create_block(far, 1),
            Err(WorldError::InactiveChunk(ChunkCoordinate::new(100, 0, 0)))
        );
        assert_eq!(
            world.remove_block(Point3::new(0, -1, 0)),
            Err(WorldError::InactiveChunk(ChunkCoordinate::new(0, -1, 0)))
        );
        assert_eq!(
            world.create_block(Point3::new(0, 0, 0), AIR),
            Err(WorldError::InvalidBlockType(AIR))
        );
        assert_eq!(
            world.create_block(Point3::new(0, 0, 0), 200),
            Err(WorldError::InvalidBlockType(200))
        );
    }

    #[test]
    fn results_from_before_a_reset_are_discarded() {
        let mut world = test_world(1, 1, 0);
        // Generation runs inline at the end of the tick, its result is not applied yet.
        world.tick(Point3::new(0.0, 0.0, 0.0));

        world.restore(7, Vec::new(), Point3::new(0.0, 0.0, 0.0));
        world.finish_pending_work();
        assert!(world.stale_results() >= 1);

        settle(&mut world, Point3::new(0.0, 0.0, 0.0));
        let field = DensityField::new(7, world.settings().clone());
        for coordinate in world.active_chunks() {
            let expected = chunk_creation::generate(coordinate.origin(4), &field);
            assert_eq!(world.chunk(*coordinate).and_then(Chunk::grid), Some(&expected));
        }
    }

    #[test]
    fn failed_jobs_return_to_pending_and_retry() {
        let mut world = test_world(0, 1, 0);
        let origin = ChunkCoordinate::new(0, 0, 0);
        world.tick(Point3::new(0.0, 0.0, 0.0));
        let chunk = world.chunk(origin).expect("created");
        assert_eq!(chunk.state(), ChunkState::Generating);

        let job = JobTicket {
            coordinate: origin,
            epoch: world.epoch(),
            ticket: chunk.ticket(),
        };
        let field = Arc::new(DensityField::new(99, world.settings().clone()));
        let follow_up = ChunkGenerationTask::new(job, field)
            .abandon()
            .handle_result(&mut world);
        assert!(follow_up.is_empty());
        assert_eq!(world.chunk(origin).map(Chunk::state), Some(ChunkState::Pending));

        // The first result arrives for a job that no longer runs.
        world.finish_pending_work();
        assert_eq!(world.chunk(origin).map(Chunk::state), Some(ChunkState::Pending));

        settle(&mut world, Point3::new(0.0, 0.0, 0.0));
        assert!(world.chunk(origin).is_some_and(Chunk::is_ready));
    }

    #[test]
    fn edits_supersede_meshes_in_flight() {
        let mut world = test_world(0, 1, 0);
        settle(&mut world, Point3::new(0.0, 0.0, 0.0));
        let origin = ChunkCoordinate::new(0, 0, 0);

        // Force a remesh, then edit before its result is applied.
        world.restore(
            world.seed(),
            world.capture_chunks(),
            Point3::new(0.0, 0.0, 0.0),
        );
        world.tick(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(world.chunk(origin).map(Chunk::state), Some(ChunkState::Meshing));

        world.create_block(Point3::new(0, 0, 0), 1).expect("grid is loaded");
        let edited = world.chunk(origin).and_then(Chunk::mesh).cloned();
        world.finish_pending_work();

        assert!(world.stale_results() >= 1);
        assert_eq!(world.chunk(origin).and_then(Chunk::mesh).cloned(), edited);
        assert_eq!(world.block_at(Point3::new(0, 0, 0)), Some(1));
    }

    #[test]
    fn evicted_meshes_are_rebuilt_on_return() {
        let settings = Arc::new(ChunkSettings {
            chunk_size: 4,
            ..ChunkSettings::default()
        });
        let stream = StreamSettings {
            view_distance: 1,
            layer_count: 1,
            activations_per_tick: 5,
            inactive_mesh_budget: 0,
        };
        let mut world = World::new(settings, stream, 0, 5);
        let home = Point3::new(0.0, 0.0, 0.0);
        settle(&mut world, home);

        settle(&mut world, Point3::new(400.0, 0.0, 0.0));
        let origin = world.chunk(ChunkCoordinate::new(0, 0, 0)).expect("kept");
        assert_eq!(origin.state(), ChunkState::Pending);
        assert!(origin.mesh().is_none());
        assert!(origin.grid().is_some());

        settle(&mut world, home);
        assert!(world
            .chunk(ChunkCoordinate::new(0, 0, 0))
            .is_some_and(|c| c.is_ready() && c.is_active()));
    }

    #[test]
    fn queued_meshes_survive_a_small_budget() {
        let settings = Arc::new(ChunkSettings {
            chunk_size: 4,
            ..ChunkSettings::default()
        });
        let stream = StreamSettings {
            view_distance: 3,
            layer_count: 1,
            activations_per_tick: 1,
            inactive_mesh_budget: 2,
        };
        let mut world = World::new(settings, stream, 0, 99);
        settle(&mut world, Point3::new(0.0, 0.0, 0.0));

        assert_eq!(world.active_chunks().len(), 29);
        for coordinate in world.active_chunks() {
            let chunk = world.chunk(*coordinate).expect("active chunk is held");
            assert!(chunk.is_ready());
            assert_eq!(chunk.ticket(), 1, "{coordinate:?} was built more than once");
        }
        assert_eq!(world.stale_results(), 0);
    }

    #[test]
    fn far_observers_stream_nothing() {
        let mut world = test_world(2, 1, 0);
        world.tick(Point3::new(1.0e30, 0.0, 0.0));
        world.tick(Point3::new(f32::INFINITY, 0.0, -1.0e30));
        world.finish_pending_work();

        assert_eq!(world.all_chunk_count(), 0);
        assert!(world.is_world_settled());
    }

    #[test]
    fn worker_pool_settles_the_same_world() {
        let mut threaded = test_world(2, 1, 3);
        let mut inline = test_world(2, 1, 0);
        settle(&mut threaded, Point3::new(-3.0, 0.0, 7.0));
        settle(&mut inline, Point3::new(-3.0, 0.0, 7.0));

        assert_eq!(threaded.capture_chunks(), inline.capture_chunks());
        for coordinate in threaded.active_chunks() {
            assert_eq!(
                threaded.chunk(*coordinate).and_then(Chunk::mesh),
                inline.chunk(*coordinate).and_then(Chunk::mesh)
            );
        }
    }
}
