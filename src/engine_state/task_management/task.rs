//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system.
//!
//! ## Core Components
//! - `Task`: A unit of work that can be executed on a worker thread
//! - `TaskResult`: The outcome of a task, applied on the orchestrating thread
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called with exclusive access to the world
//! 5. The result can spawn follow-up tasks
//!
//! If `process()` panics, the worker reports `abandon()` instead, so the world
//! always learns how every dispatched job ended.

use crate::engine_state::voxels::world::World;

/// A unit of work that can be executed asynchronously.
///
/// Tasks own all the data they need. They never hold references into the
/// world, which is only touched when results are applied.
pub trait Task: Send {
    /// Performs the work. Runs on a worker thread.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be applied on the orchestrating thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;

    /// Builds the result reported when `process()` panicked.
    fn abandon(&self) -> Box<dyn TaskResult + Send>;
}

/// The result of processing a `Task`.
///
/// Results are applied on the orchestrating thread, one at a time, and should
/// stay cheap.
pub trait TaskResult: Send {
    /// Applies the result to the world.
    ///
    /// # Arguments
    /// * `world` - The world that dispatched the task
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty)
    fn handle_result(self: Box<Self>, world: &mut World) -> Vec<Box<dyn Task + Send>>;
}
