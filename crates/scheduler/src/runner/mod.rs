//! Scheduler runner -- task intake, state transitions, and pass execution.
//!
//! Split into focused submodules:
//! - `core`: Scheduler handle, constructors, intake, pause/resume, inspection
//! - `execution`: `run_ready` passes, per-task time slots, cancellation

mod core;
mod execution;

pub use self::core::Scheduler;
