use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{RunSummary, TaskId};

/// Scheduler operational counters, exposed for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerMetrics {
    /// Passes run, including idle ones.
    pub passes: u64,
    /// Tasks run to completion.
    pub tasks_executed: u64,
    /// Time units executed across all tasks.
    pub slots_executed: u64,
    /// Tasks returned to the collection by a cancelled pass.
    pub tasks_interrupted: u64,
    /// Average wall time per task, over every completed run of that id.
    pub avg_task_duration: HashMap<TaskId, Duration>,
    /// Completed runs per task id (ids can be reused after completion).
    pub runs_by_task: HashMap<TaskId, u64>,
    /// When the last pass finished.
    pub last_pass: Option<DateTime<Utc>>,
}

impl SchedulerMetrics {
    /// Record one completed task execution.
    pub fn record_task(&mut self, id: TaskId, duration: Duration) {
        self.tasks_executed += 1;
        let count = {
            let runs = self.runs_by_task.entry(id).or_default();
            *runs += 1;
            *runs
        };
        let prev_avg = self.avg_task_duration.get(&id).copied().unwrap_or_default();

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let new_avg = if count == 1 {
            duration
        } else {
            let prev_nanos = prev_avg.as_nanos() as f64;
            let cur_nanos = duration.as_nanos() as f64;
            let avg_nanos = prev_nanos + (cur_nanos - prev_nanos) / count as f64;
            Duration::from_nanos(avg_nanos as u64)
        };
        self.avg_task_duration.insert(id, new_avg);
    }

    pub fn record_slot(&mut self) {
        self.slots_executed += 1;
    }

    /// Record the end of a pass.
    pub fn record_pass(&mut self, summary: &RunSummary) {
        self.passes += 1;
        self.tasks_interrupted += summary.requeued.len() as u64;
        self.last_pass = Some(Utc::now());
    }
}
