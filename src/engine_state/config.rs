//! # Engine Configuration
//!
//! Startup configuration for the terrain engine, read from JSON. Every field has
//! a default, so a config file only needs to name what it changes:
//!
//! ```json
//! {
//!     "chunk": { "chunk_size": 16, "optimize_faces": true },
//!     "streaming": { "view_distance": 6, "layer_count": 3 },
//!     "worker_threads": 4
//! }
//! ```
//!
//! Configuration is validated once, before any world exists. Nothing in the
//! generation path re-checks these values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::voxels::chunk::settings::ChunkSettings;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid configuration JSON
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Parameters of the streaming window around the observer.
///
/// These are fixed for the lifetime of a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Radius of the horizontal disk of desired chunks, in chunks.
    pub view_distance: u32,
    /// Number of vertical chunk layers, starting at chunk `y = 0`.
    pub layer_count: u32,
    /// Chunks moved from the activation queue to the active set per tick.
    pub activations_per_tick: usize,
    /// Inactive chunks allowed to keep their meshes.
    pub inactive_mesh_budget: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        StreamSettings {
            view_distance: 4,
            layer_count: 3,
            activations_per_tick: 1,
            inactive_mesh_budget: 256,
        }
    }
}

impl StreamSettings {
    /// Checks the streaming parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.layer_count == 0 {
            return Err("layer_count must be at least 1".to_string());
        }
        if self.activations_per_tick == 0 {
            return Err("activations_per_tick must be at least 1".to_string());
        }
        if self.view_distance > 64 {
            return Err(format!("view_distance {} exceeds 64", self.view_distance));
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Terrain and meshing parameters.
    pub chunk: ChunkSettings,
    /// Streaming window parameters.
    pub streaming: StreamSettings,
    /// Worker threads for generation and meshing. `0` runs tasks inline.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            chunk: ChunkSettings::default(),
            streaming: StreamSettings::default(),
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1).max(1))
                .unwrap_or(2),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parses and validates a JSON configuration string.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunk.validate().map_err(ConfigError::Invalid)?;
        self.streaming.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
