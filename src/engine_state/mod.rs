//! # Engine State Module
//!
//! The orchestrating side of the terrain engine.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the world and the observer pose, and drives both once per frame
//! * `config` - Startup configuration read from JSON
//! * `persistence` - Binary save files
//! * `rendering` - Meshing, collision bake and the presentation seam
//! * `task_management` - Worker pool for generation and meshing
//! * `voxels` - Chunk data, terrain generation and streaming
//!
//! ## Architecture
//!
//! Everything runs on one orchestrating thread. `EngineState::tick` advances
//! the world around the observer and forwards the resulting visibility changes
//! to a [`ChunkPresenter`] supplied by the caller. Input, camera control and
//! the raycast itself live outside this crate; they reach the engine through
//! [`EngineState::set_observer`] and the targeted edit methods.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::{info, warn};

use config::{ConfigError, EngineConfig};
use persistence::{SaveError, SaveGame, WorldStore};
use rendering::{ChunkPresenter, PresentationUpdate};
use voxels::{
    block::{block_type::AIR, BlockTypeSize},
    targeting::{RaycastHit, TargetCell, TargetResolution},
    world::{World, WorldError},
};

pub mod config;
pub mod persistence;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Where the observer is and which way it looks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverPose {
    /// World-space position
    pub position: Point3<f32>,
    /// Camera rotation about the X axis, in radians
    pub camera_pitch: f32,
    /// Body rotation about the Y axis, in radians
    pub player_yaw: f32,
}

impl Default for ObserverPose {
    fn default() -> Self {
        ObserverPose {
            position: Point3::new(0.0, 0.0, 0.0),
            camera_pitch: 0.0,
            player_yaw: 0.0,
        }
    }
}

/// The main state container for the terrain engine.
///
/// # Examples
///
/// ```no_run
/// use voxel_terrain::engine_state::{config::EngineConfig, rendering::HeadlessPresenter, EngineState};
///
/// let mut engine = EngineState::new(EngineConfig::default(), 42, HeadlessPresenter::new())?;
/// loop {
///     engine.tick();
///     if engine.world().is_world_settled() {
///         break;
///     }
/// }
/// # Ok::<(), voxel_terrain::engine_state::config::ConfigError>(())
/// ```
pub struct EngineState<P: ChunkPresenter> {
    /// The voxel world containing all chunk data
    world: World,
    /// Pose reported by the player module
    observer: ObserverPose,
    /// Backend receiving visibility changes
    presenter: P,
    /// How raycast hits are turned into block coordinates
    target_resolution: TargetResolution,
}

impl<P: ChunkPresenter> EngineState<P> {
    /// Creates an engine with an empty world.
    ///
    /// # Arguments
    /// * `config` - Engine configuration, validated here
    /// * `seed` - Generation seed
    /// * `presenter` - Backend that draws the active chunks
    pub fn new(config: EngineConfig, seed: i32, presenter: P) -> Result<Self, ConfigError> {
        config.validate()?;

        let world = World::new(
            Arc::new(config.chunk),
            config.streaming,
            config.worker_threads,
            seed,
        );

        Ok(EngineState {
            world,
            observer: ObserverPose::default(),
            presenter,
            target_resolution: TargetResolution::default(),
        })
    }

    /// The streamed world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The backend receiving visibility changes.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The last reported observer pose.
    pub fn observer(&self) -> ObserverPose {
        self.observer
    }

    /// Records the pose reported by the player module. Takes effect on the
    /// next tick.
    pub fn set_observer(&mut self, observer: ObserverPose) {
        self.observer = observer;
    }

    /// Chooses how later raycast hits are turned into blocks.
    pub fn set_target_resolution(&mut self, resolution: TargetResolution) {
        self.target_resolution = resolution;
    }

    /// Advances the world one frame and updates the presenter.
    pub fn tick(&mut self) {
        self.world.tick(self.observer.position);
        self.forward_presentation_updates();
    }

    /// Blocks until every in-flight job has finished, then updates the
    /// presenter.
    pub fn finish_pending_work(&mut self) {
        self.world.finish_pending_work();
        self.forward_presentation_updates();
    }

    /// Places a block in front of the hit face.
    ///
    /// # Returns
    /// The block coordinate that was filled, or `WorldError::OutOfBounds` if
    /// the cell is neither in the hit chunk nor next to it.
    pub fn place_targeted_block(
        &mut self,
        hit: &RaycastHit,
        block_type: BlockTypeSize,
    ) -> Result<Point3<i32>, WorldError> {
        let block = self.resolve_target(hit, TargetCell::Adjacent)?;
        self.world.create_block(block, block_type)?;
        self.forward_presentation_updates();
        Ok(block)
    }

    /// Removes the block that was hit.
    ///
    /// # Returns
    /// The block coordinate that was cleared.
    pub fn remove_targeted_block(&mut self, hit: &RaycastHit) -> Result<Point3<i32>, WorldError> {
        let block = self.resolve_target(hit, TargetCell::Hit)?;
        self.world.remove_block(block)?;
        self.forward_presentation_updates();
        Ok(block)
    }

    /// How long the block that was hit takes to destroy, `None` for air, an
    /// unloaded chunk or a hit that does not match its chunk.
    pub fn targeted_destroy_duration(&self, hit: &RaycastHit) -> Option<Duration> {
        let block = self.resolve_target(hit, TargetCell::Hit).ok()?;
        self.world.destroy_duration(block)
    }

    /// Block type under the hit, `None` if its chunk has no data.
    pub fn targeted_block(&self, hit: &RaycastHit) -> Option<BlockTypeSize> {
        let block = self.resolve_target(hit, TargetCell::Hit).ok()?;
        self.world.block_at(block).filter(|&t| t != AIR)
    }

    /// Writes the observer pose, the seed and every generated chunk to `path`.
    ///
    /// # Returns
    /// The number of bytes written.
    pub fn save_game<Q: AsRef<Path>>(&self, path: Q) -> Result<usize, SaveError> {
        let save = SaveGame {
            observer: self.observer,
            seed: self.world.seed(),
            chunks: self.world.capture_chunks(),
        };
        WorldStore::new(path).save(&save)
    }

    /// Replaces the world with the contents of `path`.
    ///
    /// The file is fully decoded and validated first. On error the world, the
    /// observer and the presenter are left untouched.
    pub fn load_game<Q: AsRef<Path>>(&mut self, path: Q) -> Result<(), SaveError> {
        let store = WorldStore::new(path);
        let save = match store.load(self.world.settings()) {
            Ok(save) => save,
            Err(e) => {
                warn!("Rejected save {}: {e}", store.path().display());
                return Err(e);
            }
        };

        let SaveGame {
            observer,
            seed,
            chunks,
        } = save;
        self.observer = observer;
        self.world.restore(seed, chunks, observer.position);
        self.forward_presentation_updates();

        info!(
            "Loaded game: observer at {:?}, seed {seed}",
            observer.position
        );
        Ok(())
    }

    fn resolve_target(&self, hit: &RaycastHit, cell: TargetCell) -> Result<Point3<i32>, WorldError> {
        hit.resolve_in_chunk(cell, self.target_resolution, self.world.settings().chunk_size)
    }

    fn forward_presentation_updates(&mut self) {
        for update in self.world.drain_presentation_updates() {
            match update {
                PresentationUpdate::Show(coordinate) => {
                    let Some(chunk) = self.world.chunk(coordinate) else {
                        continue;
                    };
                    if let (Some(mesh), Some(collision)) = (chunk.mesh(), chunk.collision()) {
                        self.presenter.present(coordinate, mesh, collision);
                    }
                }
                PresentationUpdate::Hide(coordinate) => self.presenter.withdraw(coordinate),
                PresentationUpdate::Clear => self.presenter.clear(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cgmath::Vector3;

    use super::*;
    use super::{
        config::StreamSettings,
        rendering::HeadlessPresenter,
        voxels::chunk::{coordinate::ChunkCoordinate, settings::ChunkSettings},
    };

    fn config(chunk_size: u32, view_distance: u32) -> EngineConfig {
        EngineConfig {
            chunk: ChunkSettings {
                chunk_size,
                ..ChunkSettings::default()
            },
            streaming: StreamSettings {
                view_distance,
                layer_count: 1,
                ..StreamSettings::default()
            },
            worker_threads: 0,
        }
    }

    fn engine(chunk_size: u32, view_distance: u32, seed: i32) -> EngineState<HeadlessPresenter> {
        EngineState::new(config(chunk_size, view_distance), seed, HeadlessPresenter::new())
            .expect("valid config")
    }

    fn settle(engine: &mut EngineState<HeadlessPresenter>) {
        for _ in 0..500 {
            engine.tick();
            if engine.world().is_world_settled() {
                engine.finish_pending_work();
                return;
            }
        }
        panic!("world did not settle");
    }

    fn top_face_hit(x: i32, y: i32, z: i32) -> RaycastHit {
        RaycastHit {
            point: Point3::new(x as f32 + 0.2, y as f32 + 0.5, z as f32 - 0.1),
            normal: Vector3::new(0.0, 1.0, 0.0),
            chunk: ChunkCoordinate::from_block(Point3::new(x, y, z), 4),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut bad = config(4, 1);
        bad.chunk.block_palette.clear();
        let result = EngineState::new(bad, 0, HeadlessPresenter::new());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn settled_world_is_presented() {
        let mut engine = engine(4, 2, 7);
        settle(&mut engine);

        assert_eq!(engine.world().active_chunks().len(), 13);
        assert_eq!(engine.presenter().visible_chunks(), 13);
    }

    #[test]
    fn moving_away_withdraws_chunks() {
        let mut engine = engine(4, 1, 7);
        settle(&mut engine);
        assert!(engine.presenter().is_visible(ChunkCoordinate::new(-1, 0, 0)));

        engine.set_observer(ObserverPose {
            position: Point3::new(40.0, 0.0, 0.0),
            ..ObserverPose::default()
        });
        settle(&mut engine);

        assert!(!engine.presenter().is_visible(ChunkCoordinate::new(-1, 0, 0)));
        assert!(engine.presenter().is_visible(ChunkCoordinate::new(10, 0, 0)));
        assert_eq!(engine.presenter().visible_chunks(), 5);
    }

    #[test]
    fn targeted_edits_use_the_hit_face() {
        let mut engine = engine(4, 0, 3);
        settle(&mut engine);

        let placed = engine
            .place_targeted_block(&top_face_hit(1, 1, 1), 3)
            .expect("place");
        assert_eq!(placed, Point3::new(1, 2, 1));
        assert_eq!(engine.world().block_at(placed), Some(3));
        assert_eq!(engine.targeted_block(&top_face_hit(1, 2, 1)), Some(3));
        assert_eq!(
            engine.targeted_destroy_duration(&top_face_hit(1, 2, 1)),
            Some(Duration::from_millis(500))
        );

        let removed = engine
            .remove_targeted_block(&top_face_hit(1, 2, 1))
            .expect("remove");
        assert_eq!(removed, placed);
        assert_eq!(engine.world().block_at(placed), Some(AIR));
        assert_eq!(engine.targeted_block(&top_face_hit(1, 2, 1)), None);

        let outside = engine.remove_targeted_block(&top_face_hit(40, 1, 1));
        assert!(matches!(outside, Err(WorldError::InactiveChunk(_))));
    }

    #[test]
    fn hits_reported_for_another_chunk_are_refused() {
        let mut engine = engine(4, 1, 3);
        settle(&mut engine);

        let mismatched = RaycastHit {
            chunk: ChunkCoordinate::new(-1, 0, 0),
            ..top_face_hit(1, 1, 1)
        };
        let before = engine.world().block_at(Point3::new(1, 1, 1));

        assert_eq!(
            engine.remove_targeted_block(&mismatched),
            Err(WorldError::OutOfBounds(Point3::new(1, 1, 1)))
        );
        assert_eq!(engine.world().block_at(Point3::new(1, 1, 1)), before);
        assert_eq!(engine.targeted_block(&mismatched), None);
        assert_eq!(engine.targeted_destroy_duration(&mismatched), None);

        let far = RaycastHit {
            chunk: ChunkCoordinate::new(-1, 0, 1),
            ..top_face_hit(1, 2, 1)
        };
        assert_eq!(
            engine.place_targeted_block(&far, 3),
            Err(WorldError::OutOfBounds(Point3::new(1, 3, 1)))
        );
    }

    #[test]
    fn saves_with_unreachable_observers_are_refused() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("far.sav");
        let save = SaveGame {
            observer: ObserverPose {
                position: Point3::new(1.0e30, 0.0, 0.0),
                ..ObserverPose::default()
            },
            seed: 1,
            chunks: Vec::new(),
        };
        WorldStore::new(&path).save(&save).expect("save");

        let mut engine = engine(4, 1, 5);
        settle(&mut engine);
        let chunks = engine.world().all_chunk_count();

        let result = engine.load_game(&path);
        assert!(matches!(result, Err(SaveError::CorruptSaveData { .. })));
        assert_eq!(engine.world().seed(), 5);
        assert_eq!(engine.world().all_chunk_count(), chunks);
        assert_eq!(engine.observer(), ObserverPose::default());
        engine.tick();
    }

    #[test]
    fn full_chunk_survives_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("world.sav");

        let mut source = engine(4, 0, 11);
        source.set_observer(ObserverPose {
            position: Point3::new(1.0, 2.0, 3.0),
            camera_pitch: 0.25,
            player_yaw: -1.5,
        });
        settle(&mut source);
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    source
                        .world
                        .create_block(Point3::new(x, y, z), 1)
                        .expect("fill");
                }
            }
        }
        source.save_game(&path).expect("save");

        let mut target = engine(4, 0, 99);
        settle(&mut target);
        target.load_game(&path).expect("load");
        settle(&mut target);

        assert_eq!(target.world().seed(), 11);
        assert_eq!(target.observer(), source.observer());
        assert_eq!(target.world().all_chunk_count(), 1);
        let chunk = target
            .world()
            .chunk(ChunkCoordinate::new(0, 0, 0))
            .expect("restored chunk");
        let grid = chunk.grid().expect("restored grid");
        assert!(grid.as_bytes().iter().all(|&t| t == 1));
        assert!(target.presenter().is_visible(ChunkCoordinate::new(0, 0, 0)));
    }

    #[test]
    fn rejected_load_leaves_world_untouched() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("broken.sav");
        fs::write(&path, [1u8, 2, 3]).expect("write");

        let mut engine = engine(4, 1, 5);
        let pose = ObserverPose {
            position: Point3::new(2.0, 0.0, 2.0),
            ..ObserverPose::default()
        };
        engine.set_observer(pose);
        settle(&mut engine);
        let chunks = engine.world().all_chunk_count();
        let epoch = engine.world().epoch();

        let result = engine.load_game(&path);
        assert!(matches!(result, Err(SaveError::CorruptSaveData { .. })));
        assert_eq!(engine.world().seed(), 5);
        assert_eq!(engine.world().epoch(), epoch);
        assert_eq!(engine.world().all_chunk_count(), chunks);
        assert_eq!(engine.observer(), pose);
        assert_eq!(engine.presenter().visible_chunks(), 5);
    }
}
