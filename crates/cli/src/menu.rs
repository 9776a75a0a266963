//! Interactive menu loop driving the scheduler from line-based input.

use anyhow::{Context, Result};
use microsched::{Priority, ProgressEvent, Scheduler, SchedulerError, TaskId, Worker};
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::terminal::Terminal;

/// How often the menu checks for pass completion while rendering progress.
const PROGRESS_POLL: Duration = Duration::from_millis(25);

/// Result of reading one value from the input.
enum Input<T> {
    Value(T),
    Invalid(String),
    Eof,
}

/// The menu owns the worker; the scheduler handle is shared with it.
pub struct Menu<R: BufRead, W: Write> {
    input: R,
    terminal: Terminal<W>,
    scheduler: Scheduler,
    worker: Worker,
    events: Receiver<ProgressEvent>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(
        input: R,
        terminal: Terminal<W>,
        worker: Worker,
        events: Receiver<ProgressEvent>,
    ) -> Self {
        let scheduler = worker.scheduler().clone();
        Self {
            input,
            terminal,
            scheduler,
            worker,
            events,
        }
    }

    /// Run until the user exits or the input ends.
    pub fn run(mut self) -> Result<()> {
        self.terminal
            .print_banner(self.scheduler.time_unit().as_millis() as u64)?;
        loop {
            self.terminal.print_menu()?;
            let choice = match self.read_line()? {
                Some(line) => line,
                None => break,
            };
            debug!(choice = %choice, "menu choice");

            let keep_going = match choice.as_str() {
                "1" => self.add_task()?,
                "2" => self.execute()?,
                "3" => self.pause_task()?,
                "4" => self.resume_all()?,
                "5" => self.print_queue()?,
                "6" => false,
                "7" => self.resume_task()?,
                "8" => self.print_metrics()?,
                _ => {
                    self.terminal.print_error("Invalid choice! Please try again.")?;
                    true
                }
            };
            if !keep_going {
                break;
            }
        }

        self.terminal.print_info("Exiting...")?;
        self.worker
            .shutdown()
            .context("scheduler worker did not stop cleanly")?;
        Ok(())
    }

    fn add_task(&mut self) -> Result<bool> {
        let id = match self.prompt::<TaskId>("Enter Task ID: ")? {
            Input::Value(v) => v,
            Input::Invalid(raw) => return self.invalid_number(&raw),
            Input::Eof => return Ok(false),
        };
        let duration = match self.prompt::<u32>("Enter Task Duration (in time slots): ")? {
            Input::Value(v) => v,
            Input::Invalid(raw) => return self.invalid_number(&raw),
            Input::Eof => return Ok(false),
        };
        let priority = match self.prompt::<Priority>("Enter Task Priority: ")? {
            Input::Value(v) => v,
            Input::Invalid(raw) => return self.invalid_number(&raw),
            Input::Eof => return Ok(false),
        };

        match self.scheduler.add_task(id, duration, priority) {
            Ok(()) => self.terminal.print_info(&format!(
                "Task {id} added (duration {duration}, priority {priority})."
            ))?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn execute(&mut self) -> Result<bool> {
        self.terminal.print_info("Executing unpaused tasks...")?;
        let pending = match self.worker.run_ready() {
            Ok(pending) => pending,
            Err(e) => {
                self.report(&e)?;
                return Ok(true);
            }
        };

        let summary = loop {
            match self.events.recv_timeout(PROGRESS_POLL) {
                Ok(event) => self.terminal.display_event(&event)?,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {}
            }
            if let Some(result) = pending.try_result() {
                break result;
            }
        };
        // Events are sent before the summary, so whatever is left is already queued.
        while let Ok(event) = self.events.try_recv() {
            self.terminal.display_event(&event)?;
        }

        match summary {
            Ok(summary) => self.terminal.print_summary(&summary)?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn pause_task(&mut self) -> Result<bool> {
        let id = match self.prompt::<TaskId>("Enter Task ID to pause: ")? {
            Input::Value(v) => v,
            Input::Invalid(raw) => return self.invalid_number(&raw),
            Input::Eof => return Ok(false),
        };
        match self.scheduler.pause_task(id) {
            Ok(()) => self.terminal.print_info(&format!("Task {id} is now paused."))?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn resume_all(&mut self) -> Result<bool> {
        match self.scheduler.resume_all() {
            Ok(resumed) => self.terminal.print_info(&format!(
                "All paused tasks are now resumed ({resumed} task(s))."
            ))?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn resume_task(&mut self) -> Result<bool> {
        let id = match self.prompt::<TaskId>("Enter Task ID to resume: ")? {
            Input::Value(v) => v,
            Input::Invalid(raw) => return self.invalid_number(&raw),
            Input::Eof => return Ok(false),
        };
        match self.scheduler.resume_task(id) {
            Ok(()) => self.terminal.print_info(&format!("Task {id} resumed."))?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn print_queue(&mut self) -> Result<bool> {
        match self.scheduler.snapshot() {
            Ok(tasks) => self.terminal.print_queue(&tasks)?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn print_metrics(&mut self) -> Result<bool> {
        match self.scheduler.metrics() {
            Ok(metrics) => self.terminal.print_metrics(&metrics)?,
            Err(e) => self.report(&e)?,
        }
        Ok(true)
    }

    fn report(&mut self, err: &SchedulerError) -> Result<()> {
        warn!(error = %err, "scheduler rejected request");
        self.terminal.print_error(&format!("Error: {err}"))
    }

    fn invalid_number(&mut self, raw: &str) -> Result<bool> {
        self.terminal.print_error(&format!("Invalid number: {raw:?}"))?;
        Ok(true)
    }

    fn prompt<T: FromStr>(&mut self, label: &str) -> Result<Input<T>> {
        self.terminal.prompt(label)?;
        Ok(match self.read_line()? {
            Some(line) => match line.parse::<T>() {
                Ok(v) => Input::Value(v),
                Err(_) => Input::Invalid(line),
            },
            None => Input::Eof,
        })
    }

    /// Next trimmed line, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
