//! Background worker running scheduler passes on a dedicated thread.
//!
//! The worker owns a clone of the [`Scheduler`] handle and receives commands
//! over a channel. Callers keep using their own handle to add, pause, or
//! resume tasks while a pass runs; those changes only affect later passes.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::SchedulerError;
use crate::runner::Scheduler;
use crate::types::RunSummary;

type RunResult = Result<RunSummary, SchedulerError>;

enum Command {
    RunReady { reply: Sender<RunResult> },
    Shutdown,
}

/// Single background thread that executes passes one at a time, in request order.
pub struct Worker {
    scheduler: Scheduler,
    commands: Sender<Command>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Start the worker thread, named after [`Scheduler::worker_name`].
    pub fn spawn(scheduler: Scheduler) -> Result<Self, SchedulerError> {
        let (commands, inbox) = mpsc::channel();
        let runner = scheduler.clone();
        let handle = thread::Builder::new()
            .name(scheduler.worker_name().to_string())
            .spawn(move || worker_loop(runner, inbox))
            .map_err(|e| SchedulerError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            scheduler,
            commands,
            handle: Some(handle),
        })
    }

    /// The scheduler this worker runs passes for.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Queue a pass without blocking. The returned [`PendingRun`] delivers its summary.
    pub fn run_ready(&self) -> Result<PendingRun, SchedulerError> {
        let (reply, result) = mpsc::channel();
        self.commands
            .send(Command::RunReady { reply })
            .map_err(|_| SchedulerError::WorkerStopped)?;
        Ok(PendingRun { result })
    }

    /// Cancel the pass in progress at its next time-unit boundary.
    pub fn cancel(&self) {
        self.scheduler.cancel();
    }

    /// Stop the worker after already-queued passes finish, and join its thread.
    pub fn shutdown(mut self) -> Result<(), SchedulerError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), SchedulerError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // A send error means the thread is already gone; join still reaps it.
        let _ = self.commands.send(Command::Shutdown);
        handle.join().map_err(|_| SchedulerError::WorkerStopped)
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "worker did not stop cleanly");
        }
    }
}

fn worker_loop(scheduler: Scheduler, inbox: Receiver<Command>) {
    info!(worker = scheduler.worker_name(), "worker started");
    while let Ok(command) = inbox.recv() {
        match command {
            Command::RunReady { reply } => {
                let result = scheduler.run_ready();
                if let Err(e) = &result {
                    warn!(error = %e, "pass failed");
                }
                // The requester may have stopped waiting.
                let _ = reply.send(result);
            }
            Command::Shutdown => break,
        }
    }
    info!(worker = scheduler.worker_name(), "worker stopped");
}

/// Completion signal for a pass queued on a [`Worker`].
///
/// The summary is delivered once; after a successful `wait_timeout` or
/// `try_result`, further calls report [`SchedulerError::WorkerStopped`].
pub struct PendingRun {
    result: Receiver<RunResult>,
}

impl PendingRun {
    /// Block until the pass finishes.
    pub fn wait(self) -> RunResult {
        self.result.recv().map_err(|_| SchedulerError::WorkerStopped)?
    }

    /// Block for at most `timeout`. `None` means the pass is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<RunResult> {
        match self.result.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(SchedulerError::WorkerStopped)),
        }
    }

    /// Non-blocking check. `None` means the pass is still running.
    pub fn try_result(&self) -> Option<RunResult> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SchedulerError::WorkerStopped)),
        }
    }
}
