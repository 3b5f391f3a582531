//! # Task Management System
//!
//! This module provides the worker pool that keeps chunk generation and meshing
//! off the orchestrating thread.
//!
//! ## Components
//! - `TaskManager`: Owns the workers, hands out tasks and collects results
//! - `Task`: Work that runs on a worker against owned data
//! - `TaskResult`: Applied to the world on the orchestrating thread, may return follow-up tasks
//! - `TaskChannel`: The task and result channels of one worker
//!
//! ## Worker Model
//! - A pool of `std::thread` workers, each with a dedicated pair of mpsc channels
//! - Round-robin dispatch, at most `MAX_TASKS_IN_FLIGHT` tasks per worker
//! - Tasks that find every worker busy wait in a FIFO queue
//! - A panic inside a task is caught on the worker and reported through
//!   `Task::abandon`, so the worker stays alive
//! - With zero workers, queued tasks run inline on the orchestrating thread when
//!   `process_queued_tasks()` is called
//!
//! ## Task Lifecycle
//! 1. The world publishes tasks with `TaskManager::publish_task()`
//! 2. The manager hands tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. The owner collects results with `process_completed_tasks()` and applies them
//! 5. Results can spawn new tasks, which are published again
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(num_workers);
//!
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // In the frame loop:
//! for result in task_manager.process_completed_tasks() {
//!     for task in result.handle_result(&mut world) {
//!         task_manager.publish_task(task);
//!     }
//! }
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error, info};
use task::{Task, TaskResult};

/// A communication channel between the orchestrating thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `worker`: Handle to the worker thread, joined on drop
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and joining worker threads
/// - Distributing tasks across available workers
/// - Collecting task results
/// - Queuing tasks when all workers are busy
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    /// Results of tasks executed inline, waiting to be collected
    inline_results: Vec<Box<dyn TaskResult + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// Runs a task, turning a panic into the task's abandon result.
fn run_contained(task: &(dyn Task + Send)) -> Box<dyn TaskResult + Send> {
    match panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Task panicked: {message}");
            task.abandon()
        }
    }
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. `0` runs every task
    ///   inline inside `process_queued_tasks()`.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        if num_workers > 0 {
            info!(
                "Starting {num_workers} workers, available parallelism: {:?}",
                thread::available_parallelism()
            );
        }

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = run_contained(task.as_ref());
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("terrain-worker-{index}"))
                .spawn(task_closure);

            match worker {
                Ok(worker) => channels.push(TaskChannel {
                    task_sender: task_tx,
                    result_receiver: result_rx,
                    num_tasks_in_flight: 0,
                    worker,
                }),
                Err(e) => error!("Failed to spawn worker {index}: {e}"),
            }
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            inline_results: Vec::new(),
            current_channel: 0,
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns true when no task is queued, running or waiting to be collected.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty()
            && self.inline_results.is_empty()
            && self
                .channels
                .iter()
                .all(|channel| channel.num_tasks_in_flight == 0)
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent to the worker
    /// - `Err(task)` if the worker has disconnected, handing the task back
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel using round-robin from the last used
    /// channel. Channels at `MAX_TASKS_IN_FLIGHT` are skipped.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately handed to a worker
    /// - `false` if the task was queued
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        if !self.queued_tasks.is_empty() {
            self.queued_tasks.push_back(task);
            return false;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Moves queued tasks to available workers, oldest first.
    ///
    /// Without workers, every queued task runs inline here and its result is
    /// kept for the next `process_completed_tasks()`.
    pub fn process_queued_tasks(&mut self) {
        if self.channels.is_empty() {
            while let Some(task) = self.queued_tasks.pop_front() {
                let result = run_contained(task.as_ref());
                self.inline_results.push(result);
            }
            return;
        }

        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    error!("Worker {channel_idx} disconnected");
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Collects every result that is ready without blocking.
    ///
    /// # Returns
    /// Results in the order they were received per worker. The caller applies
    /// them and publishes any follow-up tasks.
    pub fn process_completed_tasks(&mut self) -> Vec<Box<dyn TaskResult + Send>> {
        let mut results = std::mem::take(&mut self.inline_results);
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                results.push(result);
            }
        }
        results
    }

    /// Blocks until at least one in-flight task on each busy worker finishes.
    ///
    /// Queued tasks are dispatched first. Without workers this runs the queue
    /// inline and returns its results.
    pub fn wait_for_completed_tasks(&mut self) -> Vec<Box<dyn TaskResult + Send>> {
        self.process_queued_tasks();

        let mut results = std::mem::take(&mut self.inline_results);
        for (idx, channel) in self.channels.iter_mut().enumerate() {
            if channel.num_tasks_in_flight == 0 {
                continue;
            }
            match channel.result_receiver.recv() {
                Ok(result) => {
                    channel.num_tasks_in_flight -= 1;
                    results.push(result);
                }
                Err(_) => {
                    error!("Worker {idx} hung up with {} tasks in flight", channel.num_tasks_in_flight);
                    channel.num_tasks_in_flight = 0;
                }
            }
        }
        results.extend(self.process_completed_tasks());
        results
    }

    /// Drops every task that has not been handed to a worker yet.
    pub fn discard_queued_tasks(&mut self) {
        if !self.queued_tasks.is_empty() {
            debug!("Discarding {} queued tasks", self.queued_tasks.len());
            self.queued_tasks.clear();
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.queued_tasks.clear();
        for channel in self.channels.drain(..) {
            let TaskChannel {
                task_sender,
                result_receiver,
                worker,
                ..
            } = channel;
            drop(task_sender);
            drop(result_receiver);
            if worker.join().is_err() {
                error!("Worker thread panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::engine_state::voxels::world::World;

    #[derive(Default)]
    struct Counters {
        processed: AtomicUsize,
        abandoned: AtomicUsize,
    }

    struct CountingTask {
        counters: Arc<Counters>,
        explode: bool,
    }

    struct CountingResult;

    impl Task for CountingTask {
        fn process(&self) -> Box<dyn TaskResult + Send> {
            if self.explode {
                panic!("boom");
            }
            self.counters.processed.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingResult)
        }

        fn abandon(&self) -> Box<dyn TaskResult + Send> {
            self.counters.abandoned.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingResult)
        }
    }

    impl TaskResult for CountingResult {
        fn handle_result(self: Box<Self>, _world: &mut World) -> Vec<Box<dyn Task + Send>> {
            Vec::new()
        }
    }

    fn drain(manager: &mut TaskManager) -> usize {
        let mut collected = 0;
        while !manager.is_idle() {
            collected += manager.wait_for_completed_tasks().len();
        }
        collected
    }

    fn task(counters: &Arc<Counters>, explode: bool) -> Box<dyn Task + Send> {
        Box::new(CountingTask {
            counters: counters.clone(),
            explode,
        })
    }

    #[test]
    fn workers_process_every_task() {
        let counters = Arc::new(Counters::default());
        let mut manager = TaskManager::new(3);
        for _ in 0..20 {
            manager.publish_task(task(&counters, false));
        }

        assert_eq!(drain(&mut manager), 20);
        assert_eq!(counters.processed.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn panics_are_reported_as_abandoned() {
        let counters = Arc::new(Counters::default());
        let mut manager = TaskManager::new(1);
        manager.publish_task(task(&counters, true));
        manager.publish_task(task(&counters, false));

        assert_eq!(drain(&mut manager), 2);
        assert_eq!(counters.abandoned.load(Ordering::SeqCst), 1);
        assert_eq!(counters.processed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inline_mode_runs_on_process() {
        let counters = Arc::new(Counters::default());
        let mut manager = TaskManager::new(0);
        assert!(!manager.publish_task(task(&counters, false)));
        assert_eq!(counters.processed.load(Ordering::SeqCst), 0);

        manager.process_queued_tasks();
        assert_eq!(counters.processed.load(Ordering::SeqCst), 1);
        assert_eq!(manager.process_completed_tasks().len(), 1);
        assert!(manager.is_idle());
    }
}
