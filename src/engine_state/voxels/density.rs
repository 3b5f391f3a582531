//! # Density Field
//!
//! Decides whether a world position is solid and, if so, which block type it
//! holds. The field combines a 3D Perlin sample with a height gradient around
//! `ground_level`, and picks block types in horizontal strata of
//! `layer_height` blocks.
//!
//! The field is immutable and `Send + Sync`; generation tasks share it through
//! an `Arc` and evaluate it concurrently.

use std::sync::Arc;

use cgmath::Point3;
use noise::{NoiseFn, Perlin};

use super::block::{
    block_type::{self, AIR},
    BlockTypeSize,
};
use super::chunk::settings::ChunkSettings;

/// Scaling factor applied to world coordinates before sampling Perlin noise.
pub const NOISE_SCALE: f64 = 0.04;

/// Deterministic terrain density for one generation seed.
#[derive(Clone)]
pub struct DensityField {
    perlin: Perlin,
    settings: Arc<ChunkSettings>,
}

impl DensityField {
    /// Creates a density field.
    ///
    /// # Arguments
    /// * `seed` - World generation seed, reinterpreted bitwise as the noise seed
    /// * `settings` - Shared terrain parameters
    pub fn new(seed: i32, settings: Arc<ChunkSettings>) -> Self {
        DensityField {
            perlin: Perlin::new(seed as u32),
            settings,
        }
    }

    /// The settings this field was built with.
    pub fn settings(&self) -> &Arc<ChunkSettings> {
        &self.settings
    }

    /// Returns true if the block at `world_position` is solid.
    pub fn is_solid(&self, world_position: Point3<i32>) -> bool {
        let sample = self.perlin.get([
            world_position.x as f64 * NOISE_SCALE,
            world_position.y as f64 * NOISE_SCALE,
            world_position.z as f64 * NOISE_SCALE,
        ]);
        let height = self.settings.ground_level - world_position.y as f64;

        sample * self.settings.perlin_weight + height * self.settings.height_weight > 1.0
    }

    /// Returns the block type at `world_position`, [`AIR`] when empty.
    pub fn classify(&self, world_position: Point3<i32>) -> BlockTypeSize {
        if !self.is_solid(world_position) {
            return AIR;
        }
        let layer = (world_position.y as i64).div_euclid(self.settings.layer_height as i64);
        block_type::from_layer(layer, self.settings.block_palette.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_world() {
        let settings = Arc::new(ChunkSettings::default());
        let a = DensityField::new(1337, settings.clone());
        let b = DensityField::new(1337, settings);

        for x in -20..20 {
            for y in -4..40 {
                let position = Point3::new(x * 3, y, x - y);
                assert_eq!(a.classify(position), b.classify(position));
                assert_eq!(a.classify(position), a.classify(position));
            }
        }
    }

    #[test]
    fn deep_ground_is_solid_and_sky_is_empty() {
        let settings = Arc::new(ChunkSettings::default());
        let field = DensityField::new(7, settings.clone());

        // |noise| <= ~1, so the height term dominates far from ground_level.
        assert!(field.is_solid(Point3::new(5, -200, 5)));
        assert!(!field.is_solid(Point3::new(5, 400, 5)));
        assert_eq!(field.classify(Point3::new(5, -200, 5)), 1);
    }

    #[test]
    fn block_type_follows_strata() {
        let mut settings = ChunkSettings::default();
        settings.perlin_weight = 0.0;
        settings.height_weight = 1.0;
        settings.ground_level = 1000.0;
        let field = DensityField::new(0, Arc::new(settings));

        assert_eq!(field.classify(Point3::new(0, 0, 0)), 1);
        assert_eq!(field.classify(Point3::new(0, 8, 0)), 2);
        assert_eq!(field.classify(Point3::new(0, 17, 0)), 3);
        assert_eq!(field.classify(Point3::new(0, 500, 0)), 4);
    }
}
