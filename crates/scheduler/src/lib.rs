//! Priority-based micro-scheduler with pause/resume and a single background worker.
//!
//! The [`Scheduler`] owns an ordered collection of tasks. Lower priority values
//! run first; ties run in insertion order. [`Scheduler::run_ready`] executes
//! every runnable task synchronously on the calling thread, while [`Worker`]
//! runs passes on one dedicated thread and signals completion explicitly.

pub mod config;
pub mod error;
pub mod metrics;
pub mod progress;
mod queue;
pub mod runner;
pub mod types;
pub mod worker;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use metrics::SchedulerMetrics;
pub use progress::{ChannelObserver, NoopObserver, ProgressEvent, ProgressObserver};
pub use runner::Scheduler;
pub use types::{Priority, RunSummary, TaskId, TaskSnapshot, TaskState};
pub use worker::{PendingRun, Worker};
