//! # Block Module
//!
//! Block-level definitions shared by generation, meshing and persistence.
//! A block is stored as a single byte in a chunk's voxel grid: `0` is empty
//! space and `n > 0` refers to entry `n - 1` of the configured block palette.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory and on disk.
pub type BlockTypeSize = u8;

/// RGBA color with 8 bits per channel, applied to every vertex of a block.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Color {
    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }
}

/// One entry of the block palette.
///
/// The palette is ordered: the first entry describes block type `1`, the
/// second block type `2`, and so on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Vertex color used for every block of this type.
    pub color: Color,
    /// How long the player has to hold the destroy action to remove the block.
    pub destroy_duration_millis: u32,
}

impl PaletteEntry {
    /// Creates a palette entry.
    pub fn new(color: Color, destroy_duration_millis: u32) -> Self {
        PaletteEntry {
            color,
            destroy_duration_millis,
        }
    }

    /// The destroy duration as a [`Duration`].
    pub fn destroy_duration(&self) -> Duration {
        Duration::from_millis(self.destroy_duration_millis as u64)
    }
}
