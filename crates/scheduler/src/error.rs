//! Scheduler error types.

use thiserror::Error;

use crate::types::TaskId;

/// Rejections reported by scheduler operations.
///
/// None of these are fatal. A rejected operation leaves the task collection
/// exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("invalid task parameter: {0}")]
    InvalidTaskParameter(String),

    #[error("task id already tracked: {0}")]
    DuplicateTaskId(TaskId),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The task was taken by the pass currently running and can no longer change state.
    #[error("task already dispatched: {0}")]
    TaskDispatched(TaskId),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("failed to spawn worker: {0}")]
    WorkerSpawn(String),

    #[error("worker stopped")]
    WorkerStopped,
}
