//! # Block Type Module
//!
//! Helpers for interpreting raw block-type bytes against the block palette.

use super::BlockTypeSize;

/// The empty block. Never rendered and never collidable.
pub const AIR: BlockTypeSize = 0;

/// Returns true if the block type occupies its cell.
#[inline]
pub fn is_solid(block_type: BlockTypeSize) -> bool {
    block_type != AIR
}

/// Maps a block type to its index in the palette, or `None` for [`AIR`].
#[inline]
pub fn palette_index(block_type: BlockTypeSize) -> Option<usize> {
    if is_solid(block_type) {
        Some(block_type as usize - 1)
    } else {
        None
    }
}

/// Picks the block type for a horizontal stratum.
///
/// Layer `0` and everything below it use the first palette entry, layers at or
/// above `palette_len - 1` use the last one.
///
/// # Arguments
/// * `layer` - `floor(world_y / layer_height)`, may be negative
/// * `palette_len` - Number of palette entries, at least 1
pub fn from_layer(layer: i64, palette_len: usize) -> BlockTypeSize {
    let top = palette_len.saturating_sub(1) as i64;
    (layer.clamp(0, top) + 1) as BlockTypeSize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_has_no_palette_index() {
        assert_eq!(palette_index(AIR), None);
        assert_eq!(palette_index(1), Some(0));
        assert_eq!(palette_index(4), Some(3));
    }

    #[test]
    fn layers_are_clamped_to_palette() {
        assert_eq!(from_layer(-7, 3), 1);
        assert_eq!(from_layer(0, 3), 1);
        assert_eq!(from_layer(1, 3), 2);
        assert_eq!(from_layer(2, 3), 3);
        assert_eq!(from_layer(40, 3), 3);
    }
}
