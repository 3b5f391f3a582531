//! # Voxel Terrain Entry Point
//!
//! This is the entry point of the headless driver. It simply calls into the
//! library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --seed 42 simulate --ticks 1200
//! ```

fn main() -> anyhow::Result<()> {
    voxel_terrain::run()
}
