use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unique identifier for a task tracked by the scheduler.
pub type TaskId = u64;

/// Scheduling priority. Lower numeric value = higher priority.
pub type Priority = i64;

/// Lifecycle state of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Eligible for dispatch in the next pass.
    Runnable,
    /// Skipped by passes until resumed.
    Paused,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Runnable => f.write_str("runnable"),
            TaskState::Paused => f.write_str("paused"),
        }
    }
}

/// A unit of schedulable work, owned by the task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Task {
    pub id: TaskId,
    pub priority: Priority,
    /// Duration requested at creation, in time units.
    pub duration: u32,
    /// Units still owed. Lower than `duration` only after an interrupted pass.
    pub remaining: u32,
    pub state: TaskState,
    /// Insertion sequence, used to break priority ties.
    pub seq: u64,
}

impl Task {
    pub(crate) fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            priority: self.priority,
            duration: self.duration,
            remaining: self.remaining,
            state: self.state,
        }
    }
}

/// Read-only copy of a task, as returned by [`crate::Scheduler::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub priority: Priority,
    pub duration: u32,
    pub remaining: u32,
    pub state: TaskState,
}

/// Outcome of one [`crate::Scheduler::run_ready`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Tasks run to completion, in execution order.
    pub executed: Vec<TaskId>,
    /// Paused tasks left in the collection.
    pub paused: usize,
    /// Whether the pass stopped early on a cancel request.
    pub cancelled: bool,
    /// Tasks put back as runnable because the pass was cancelled.
    pub requeued: Vec<TaskId>,
    /// Wall time spent in the pass.
    pub elapsed: Duration,
}

impl RunSummary {
    /// True when the pass had nothing to run.
    pub fn is_idle(&self) -> bool {
        self.executed.is_empty() && self.requeued.is_empty()
    }
}
