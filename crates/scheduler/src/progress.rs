//! Progress observations emitted while a pass executes.

use std::sync::mpsc::Sender;
use std::sync::Mutex;

use serde::Serialize;

use crate::types::{Priority, TaskId};

/// A single observation from [`crate::Scheduler::run_ready`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    PassStarted { runnable: usize, paused: usize },
    TaskStarted { id: TaskId, priority: Priority, remaining: u32 },
    /// One time unit elapsed for `id`.
    SlotCompleted { id: TaskId, completed: u32, remaining: u32 },
    TaskCompleted { id: TaskId },
    /// The pass was cancelled while `id` still owed `remaining` units.
    TaskInterrupted { id: TaskId, remaining: u32 },
    PassFinished { executed: usize },
}

/// Receives progress events. Called on the thread executing the pass.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forwards events over an mpsc channel, e.g. to a rendering thread.
///
/// Send failures (receiver dropped) are ignored: observation never affects execution.
pub struct ChannelObserver {
    sender: Mutex<Sender<ProgressEvent>>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_event(&self, event: &ProgressEvent) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(event.clone());
        }
    }
}
