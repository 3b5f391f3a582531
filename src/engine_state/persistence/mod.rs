//! # Persistence
//!
//! Reads and writes the binary world save (see [`format`]). Saves are built in
//! memory and then written to a sibling temporary file that is renamed over
//! the target, so an interrupted save never leaves a half-written file behind.
//! Loads read the whole file and decode it completely before returning, which
//! lets the caller validate everything before touching the live world.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::engine_state::voxels::{
    block::BlockTypeSize,
    chunk::{coordinate::ChunkCoordinate, settings::ChunkSettings},
};

pub mod format;

pub use format::SaveGame;

/// Errors from reading or writing a save.
#[derive(Error, Debug)]
pub enum SaveError {
    /// Reading, writing or renaming the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is truncated or does not describe a reachable world
    #[error("corrupt save data: {reason}")]
    CorruptSaveData {
        /// What failed to decode
        reason: String,
    },
    /// The records decode cleanly only with another chunk size
    #[error("save was written with chunk size {found}, world uses {expected}")]
    IncompatibleChunkSize {
        /// Chunk size of the current world
        expected: u32,
        /// Chunk size the records fit
        found: u32,
    },
    /// A cell holds a type that is neither air nor in the palette
    #[error("chunk {coordinate:?} contains unknown block type {block_type}")]
    InvalidBlockType {
        /// Chunk holding the cell
        coordinate: ChunkCoordinate,
        /// The unknown type
        block_type: BlockTypeSize,
    },
    /// Two records share a coordinate
    #[error("chunk {0:?} is stored more than once")]
    DuplicateChunk(ChunkCoordinate),
}

/// A save file on disk.
#[derive(Clone, Debug)]
pub struct WorldStore {
    path: PathBuf,
}

impl WorldStore {
    /// A store for the save file at `path`. Nothing is touched until the
    /// first save or load.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        WorldStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The save file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the save, replacing any previous file.
    ///
    /// # Returns
    /// The number of bytes written.
    pub fn save(&self, save: &SaveGame) -> Result<usize, SaveError> {
        let bytes = save.encode();
        let staging = self.staging_path();

        fs::write(&staging, &bytes)?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        info!(
            "Saved {} chunks ({} bytes) to {}",
            save.chunks.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(bytes.len())
    }

    /// Reads and fully validates the save.
    pub fn load(&self, settings: &ChunkSettings) -> Result<SaveGame, SaveError> {
        let bytes = fs::read(&self.path)?;
        debug!("Read {} bytes from {}", bytes.len(), self.path.display());

        let save = SaveGame::decode(&bytes, settings)?;
        info!(
            "Loaded {} chunks from {}",
            save.chunks.len(),
            self.path.display()
        );
        Ok(save)
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
