#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! A streaming voxel terrain core: procedural chunk generation from a seeded
//! density field, surface-only meshing, chunk streaming around a moving
//! observer, live block edits and binary save files.
//!
//! ## Key Modules
//!
//! * `engine_state` - The engine orchestrator and every subsystem it drives
//!
//! ## Architecture
//!
//! The crate produces geometry and density data; it never draws anything.
//! A caller supplies a [`ChunkPresenter`] that receives meshes and collision
//! for the chunks around the observer, and reports the observer's pose once
//! per frame:
//!
//! ```no_run
//! use voxel_terrain::{EngineConfig, EngineState, HeadlessPresenter, ObserverPose};
//!
//! let mut engine = EngineState::new(EngineConfig::default(), 1234, HeadlessPresenter::new())?;
//! engine.set_observer(ObserverPose::default());
//! engine.tick();
//! # Ok::<(), voxel_terrain::engine_state::config::ConfigError>(())
//! ```
//!
//! Generation and meshing run on a worker pool, so `tick` stays cheap even
//! when the observer crosses into new chunks.
//!
//! ## Headless Driver
//!
//! The `voxel-terrain` binary runs the engine without a renderer, which is
//! handy for profiling streaming and for producing or checking save files.
//! See [`run`].

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cgmath::{Point3, Vector3};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use web_time::Instant;

pub mod engine_state;

pub use engine_state::{
    config::EngineConfig,
    rendering::{ChunkPresenter, HeadlessPresenter},
    EngineState, ObserverPose,
};

/// Ticks between progress reports while simulating.
const REPORT_INTERVAL: u32 = 120;

/// Command line of the headless driver.
#[derive(Parser, Debug)]
#[command(name = "voxel-terrain", version, about = "Headless voxel terrain streaming driver")]
struct Cli {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generation seed; random when omitted
    #[arg(short, long, allow_negative_numbers = true)]
    seed: Option<i32>,

    /// Override the configured number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the observer along +X and report streaming statistics
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value_t = 600)]
        ticks: u32,
        /// Observer speed in blocks per tick
        #[arg(long, default_value_t = 0.25)]
        speed: f32,
    },
    /// Generate the area around the origin and write it to a save file
    Save {
        /// Destination save file
        path: PathBuf,
        /// Give up if the world has not settled after this many ticks
        #[arg(long, default_value_t = 10_000)]
        max_ticks: u32,
    },
    /// Load a save file and stream the world around the saved observer
    Load {
        /// Save file to read
        path: PathBuf,
        /// Give up if the world has not settled after this many ticks
        #[arg(long, default_value_t = 10_000)]
        max_ticks: u32,
    },
}

/// Runs the headless driver with the process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.worker_threads = workers;
    }

    let seed = cli.seed.unwrap_or_else(|| fastrand::i32(..));
    let mut engine = EngineState::new(config, seed, HeadlessPresenter::new())
        .context("invalid engine configuration")?;

    match cli.command {
        Command::Simulate { ticks, speed } => simulate(&mut engine, ticks, speed),
        Command::Save { path, max_ticks } => {
            let ticks = settle(&mut engine, max_ticks)?;
            let bytes = engine
                .save_game(&path)
                .with_context(|| format!("failed to save {}", path.display()))?;
            println!(
                "saved seed {seed}: {} chunks, {bytes} bytes after {ticks} ticks",
                engine.world().all_chunk_count()
            );
            Ok(())
        }
        Command::Load { path, max_ticks } => load(&mut engine, &path, max_ticks),
    }
}

fn simulate(engine: &mut EngineState<HeadlessPresenter>, ticks: u32, speed: f32) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut observer = engine.observer();

    for tick in 1..=ticks {
        observer.position += Vector3::new(speed, 0.0, 0.0);
        engine.set_observer(observer);
        engine.tick();

        if tick % REPORT_INTERVAL == 0 {
            info!(
                "tick {tick}: observer x {:.1}, {} chunks, {} active, {} visible",
                observer.position.x,
                engine.world().all_chunk_count(),
                engine.world().active_chunks().len(),
                engine.presenter().visible_chunks()
            );
        }
    }
    engine.finish_pending_work();

    let elapsed = started.elapsed();
    report(engine, ticks, elapsed);
    Ok(())
}

fn load(engine: &mut EngineState<HeadlessPresenter>, path: &Path, max_ticks: u32) -> anyhow::Result<()> {
    engine
        .load_game(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let started = Instant::now();
    let ticks = settle(engine, max_ticks)?;
    report(engine, ticks, started.elapsed());
    Ok(())
}

/// Ticks until the world is settled and returns the number of ticks taken.
fn settle(engine: &mut EngineState<HeadlessPresenter>, max_ticks: u32) -> anyhow::Result<u32> {
    for tick in 1..=max_ticks {
        engine.tick();
        if engine.world().is_world_settled() {
            engine.finish_pending_work();
            return Ok(tick);
        }
    }
    bail!("world did not settle within {max_ticks} ticks")
}

fn report(engine: &EngineState<HeadlessPresenter>, ticks: u32, elapsed: web_time::Duration) {
    let world = engine.world();
    let Point3 { x, y, z } = engine.observer().position;
    println!("seed:            {}", world.seed());
    println!("observer:        ({x:.1}, {y:.1}, {z:.1})");
    println!("ticks:           {ticks} in {elapsed:?}");
    println!("chunks held:     {}", world.all_chunk_count());
    println!("chunks active:   {}", world.active_chunks().len());
    println!("chunks visible:  {}", engine.presenter().visible_chunks());
    println!("triangles:       {}", engine.presenter().visible_triangles());
    println!("stale results:   {}", world.stale_results());
}
