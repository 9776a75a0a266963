use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::metrics::SchedulerMetrics;
use crate::progress::{NoopObserver, ProgressObserver};
use crate::queue::TaskQueue;
use crate::types::{Priority, TaskId, TaskSnapshot};

/// Handle to a priority scheduler.
///
/// Cloning is cheap and every clone refers to the same task collection, so a
/// handle can be shared with a [`crate::Worker`] or other threads. All methods
/// are safe to call concurrently; mutations hold the collection lock, while
/// the simulated work of a pass runs without it.
#[derive(Clone)]
pub struct Scheduler {
    pub(super) time_unit: Duration,
    pub(super) worker_name: String,
    pub(super) queue: Arc<Mutex<TaskQueue>>,
    /// Held for the whole of a pass so passes never overlap.
    pub(super) pass_lock: Arc<Mutex<()>>,
    pub(super) observer: Arc<dyn ProgressObserver>,
    pub(super) metrics: Arc<RwLock<SchedulerMetrics>>,
    pub(super) cancel: Arc<AtomicBool>,
}

impl Scheduler {
    /// Create an empty scheduler simulating `time_unit` of wall time per duration unit.
    pub fn new(time_unit: Duration) -> Self {
        Self {
            time_unit,
            worker_name: SchedulerConfig::default().worker_name,
            queue: Arc::new(Mutex::new(TaskQueue::new())),
            pass_lock: Arc::new(Mutex::new(())),
            observer: Arc::new(NoopObserver),
            metrics: Arc::new(RwLock::new(SchedulerMetrics::default())),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        let mut scheduler = Self::new(config.time_unit());
        scheduler.worker_name = config.worker_name.clone();
        scheduler
    }

    /// Attach an observer for progress events. Replaces any previous observer.
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn time_unit(&self) -> Duration {
        self.time_unit
    }

    pub fn worker_name(&self) -> &str {
        &self.worker_name
    }

    /// Add a runnable task.
    ///
    /// Fails with [`SchedulerError::InvalidTaskParameter`] for a zero duration
    /// and [`SchedulerError::DuplicateTaskId`] if `id` is tracked or dispatched.
    pub fn add_task(
        &self,
        id: TaskId,
        duration: u32,
        priority: Priority,
    ) -> Result<(), SchedulerError> {
        self.lock_queue()?.insert(id, duration, priority)?;
        debug!(task_id = id, duration, priority, "task added");
        Ok(())
    }

    /// Pause a tracked task so passes skip it. Pausing a paused task is a no-op.
    pub fn pause_task(&self, id: TaskId) -> Result<(), SchedulerError> {
        self.lock_queue()?.pause(id)?;
        debug!(task_id = id, "task paused");
        Ok(())
    }

    /// Resume one paused task at its original priority position.
    pub fn resume_task(&self, id: TaskId) -> Result<(), SchedulerError> {
        if self.lock_queue()?.resume(id)? {
            debug!(task_id = id, "task resumed");
        }
        Ok(())
    }

    /// Resume every paused task. Returns how many were resumed.
    pub fn resume_all(&self) -> Result<usize, SchedulerError> {
        let resumed = self.lock_queue()?.resume_all();
        if resumed > 0 {
            info!(resumed, "paused tasks resumed");
        }
        Ok(resumed)
    }

    /// Copy of the collection in dispatch order. Tasks taken by a running pass are not included.
    pub fn snapshot(&self) -> Result<Vec<TaskSnapshot>, SchedulerError> {
        Ok(self.lock_queue()?.snapshot())
    }

    pub fn len(&self) -> Result<usize, SchedulerError> {
        Ok(self.lock_queue()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SchedulerError> {
        Ok(self.len()? == 0)
    }

    /// Get a snapshot of the current scheduler metrics.
    pub fn metrics(&self) -> Result<SchedulerMetrics, SchedulerError> {
        self.metrics
            .read()
            .map(|m| m.clone())
            .map_err(|e| SchedulerError::LockPoisoned(format!("scheduler metrics: {e}")))
    }

    /// Ask the running pass to stop at the next time-unit boundary.
    pub fn cancel(&self) {
        info!("pass cancellation requested");
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Get an Arc to the cancel flag (for external cancellation signaling).
    pub fn cancel_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub(crate) fn lock_queue(&self) -> Result<MutexGuard<'_, TaskQueue>, SchedulerError> {
        self.queue
            .lock()
            .map_err(|e| SchedulerError::LockPoisoned(format!("task queue: {e}")))
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("time_unit", &self.time_unit)
            .field("worker_name", &self.worker_name)
            .finish_non_exhaustive()
    }
}
