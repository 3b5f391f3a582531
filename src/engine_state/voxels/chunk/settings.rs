//! # Chunk Settings
//!
//! Process-wide terrain parameters shared by every chunk. A single
//! `Arc<ChunkSettings>` is handed to the world, the density field and the mesh
//! tasks; nothing mutates it after construction.

use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::block::{
    block_type::{palette_index, AIR},
    BlockTypeSize, Color, PaletteEntry,
};

/// Terrain generation and meshing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSettings {
    /// Edge length of a chunk in blocks.
    pub chunk_size: u32,
    /// Multiplier applied to the Perlin sample.
    pub perlin_weight: f64,
    /// Multiplier applied to the distance below `ground_level`.
    pub height_weight: f64,
    /// World height around which the surface settles.
    pub ground_level: f64,
    /// Height of one stratum of the block palette, in blocks.
    pub layer_height: u32,
    /// Ordered palette. Entry `i` describes block type `i + 1`.
    pub block_palette: Vec<PaletteEntry>,
    /// Skip blocks with no exposed face when meshing.
    pub optimize_faces: bool,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        ChunkSettings {
            chunk_size: 16,
            perlin_weight: 4.0,
            height_weight: 0.1,
            ground_level: 24.0,
            layer_height: 8,
            block_palette: vec![
                PaletteEntry::new(Color::rgb(112, 112, 120), 1500),
                PaletteEntry::new(Color::rgb(134, 96, 67), 600),
                PaletteEntry::new(Color::rgb(96, 160, 64), 500),
                PaletteEntry::new(Color::rgb(240, 244, 250), 300),
            ],
            optimize_faces: true,
        }
    }
}

impl ChunkSettings {
    /// Number of cells in one chunk grid.
    pub fn cells_per_chunk(&self) -> usize {
        let size = self.chunk_size as usize;
        size * size * size
    }

    /// Palette entry for a block type, `None` for air or unknown types.
    pub fn palette_entry(&self, block_type: BlockTypeSize) -> Option<&PaletteEntry> {
        palette_index(block_type).and_then(|index| self.block_palette.get(index))
    }

    /// Returns true if `block_type` is air or names a palette entry.
    pub fn is_known_type(&self, block_type: BlockTypeSize) -> bool {
        block_type == AIR || self.palette_entry(block_type).is_some()
    }

    /// Checks the invariants generation and meshing rely on.
    ///
    /// # Returns
    /// A description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be at least 1".to_string());
        }
        if self.chunk_size > 256 {
            return Err(format!("chunk_size {} exceeds 256", self.chunk_size));
        }
        for (name, value) in [
            ("perlin_weight", self.perlin_weight),
            ("height_weight", self.height_weight),
            ("ground_level", self.ground_level),
        ] {
            if !value.is_finite() {
                return Err(format!("{name} must be finite, got {value}"));
            }
        }
        if self.layer_height == 0 {
            return Err("layer_height must be at least 1".to_string());
        }
        if self.block_palette.is_empty() {
            return Err("block_palette must not be empty".to_string());
        }
        if self.block_palette.len() > BlockTypeSize::MAX as usize {
            return Err(format!(
                "block_palette has {} entries, at most {} are addressable",
                self.block_palette.len(),
                BlockTypeSize::MAX
            ));
        }
        Ok(())
    }
}
