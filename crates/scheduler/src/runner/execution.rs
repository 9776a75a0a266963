use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::error::SchedulerError;
use crate::progress::ProgressEvent;
use crate::queue::TaskQueue;
use crate::types::{RunSummary, Task, TaskId};

use super::Scheduler;

enum TaskOutcome {
    Completed,
    /// Cancelled between time units, with `remaining` already reduced.
    Interrupted,
}

/// Tasks a pass has taken from the collection but not yet released.
///
/// The front entry is the task in flight. Whatever is still held when the
/// guard drops goes back to the collection, so a pass unwinding out of an
/// observer never strands its dispatched ids.
struct Dispatch<'a> {
    queue: &'a Mutex<TaskQueue>,
    pending: VecDeque<Task>,
}

impl Dispatch<'_> {
    /// Release the front task after it ran to completion.
    fn complete_front(&mut self) -> Option<TaskId> {
        let task = self.pending.pop_front()?;
        lock_recovered(self.queue).finish(task.id);
        Some(task.id)
    }

    /// Return every held task to its original position.
    fn requeue_all(&mut self) -> Vec<TaskId> {
        let mut queue = lock_recovered(self.queue);
        self.pending
            .drain(..)
            .map(|task| {
                let id = task.id;
                queue.requeue(task);
                id
            })
            .collect()
    }
}

impl Drop for Dispatch<'_> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            let requeued = self.requeue_all();
            warn!(?requeued, "pass aborted, dispatched tasks returned to the queue");
        }
    }
}

/// Queue bookkeeping after dispatch must not be skipped, so poison is ignored here.
fn lock_recovered(queue: &Mutex<TaskQueue>) -> MutexGuard<'_, TaskQueue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    /// Run every task that is runnable right now, in priority order.
    ///
    /// Blocks the calling thread for the simulated duration of each task.
    /// The dispatch set is frozen when the pass starts: tasks added or resumed
    /// meanwhile wait for the next pass, and paused tasks stay in the
    /// collection untouched. Completed tasks are dropped.
    ///
    /// A [`Scheduler::cancel`] request stops the pass at the next time-unit
    /// boundary. The task in flight goes back as runnable with its remaining
    /// units reduced, and undispatched tasks go back unchanged. The same
    /// happens when an observer panics and the pass unwinds.
    pub fn run_ready(&self) -> Result<RunSummary, SchedulerError> {
        // The pass lock guards no data; a pass that panicked leaves nothing to repair.
        let _pass = self.pass_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.cancel.store(false, Ordering::SeqCst);
        let started = Instant::now();

        let (runnable, paused) = {
            let mut queue = self.lock_queue()?;
            let runnable = queue.take_runnable();
            (runnable, queue.paused_count())
        };

        info!(runnable = runnable.len(), paused, "pass started");
        self.emit(ProgressEvent::PassStarted {
            runnable: runnable.len(),
            paused,
        });

        let mut summary = RunSummary {
            paused,
            ..RunSummary::default()
        };
        let mut dispatch = Dispatch {
            queue: &self.queue,
            pending: runnable.into(),
        };
        while let Some(task) = dispatch.pending.front_mut() {
            match self.execute_task(task) {
                TaskOutcome::Completed => {
                    if let Some(id) = dispatch.complete_front() {
                        summary.executed.push(id);
                    }
                }
                TaskOutcome::Interrupted => {
                    summary.cancelled = true;
                    summary.requeued = dispatch.requeue_all();
                    break;
                }
            }
        }
        drop(dispatch);
        summary.elapsed = started.elapsed();

        if let Ok(mut m) = self.metrics.write() {
            m.record_pass(&summary);
        }
        info!(
            executed = summary.executed.len(),
            requeued = summary.requeued.len(),
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "pass finished"
        );
        self.emit(ProgressEvent::PassFinished {
            executed: summary.executed.len(),
        });
        Ok(summary)
    }

    /// Simulate `task` one time unit at a time until it owes nothing.
    fn execute_task(&self, task: &mut Task) -> TaskOutcome {
        let started = Instant::now();
        debug!(
            task_id = task.id,
            priority = task.priority,
            remaining = task.remaining,
            "executing task"
        );
        self.emit(ProgressEvent::TaskStarted {
            id: task.id,
            priority: task.priority,
            remaining: task.remaining,
        });

        while task.remaining > 0 {
            if self.cancel.swap(false, Ordering::SeqCst) {
                info!(task_id = task.id, remaining = task.remaining, "task interrupted");
                self.emit(ProgressEvent::TaskInterrupted {
                    id: task.id,
                    remaining: task.remaining,
                });
                return TaskOutcome::Interrupted;
            }

            thread::sleep(self.time_unit);
            task.remaining -= 1;
            if let Ok(mut m) = self.metrics.write() {
                m.record_slot();
            }
            trace!(task_id = task.id, remaining = task.remaining, "time slot completed");
            self.emit(ProgressEvent::SlotCompleted {
                id: task.id,
                completed: task.duration - task.remaining,
                remaining: task.remaining,
            });
        }

        if let Ok(mut m) = self.metrics.write() {
            m.record_task(task.id, started.elapsed());
        }
        debug!(task_id = task.id, elapsed = ?started.elapsed(), "task completed");
        self.emit(ProgressEvent::TaskCompleted { id: task.id });
        TaskOutcome::Completed
    }

    fn emit(&self, event: ProgressEvent) {
        self.observer.on_event(&event);
    }
}
