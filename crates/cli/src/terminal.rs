use anyhow::Result;
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use microsched::{ProgressEvent, RunSummary, SchedulerMetrics, TaskSnapshot, TaskState};
use std::io::Write;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const PROGRESS: Color = Color::Cyan;
    const INFO: Color = Color::Green;
    const PAUSED: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

/// Renders menu, queue, and progress output.
pub struct Terminal<W: Write> {
    out: W,
    /// Emit ANSI colors; off when the output is not a terminal.
    color: bool,
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn print_banner(&mut self, time_unit_ms: u64) -> Result<()> {
        self.line(Some(Colors::HEADER), "microsched - priority micro-scheduler")?;
        self.line(
            Some(Colors::DIM),
            &format!("Time slot: {time_unit_ms}ms. Lower priority value runs first."),
        )?;
        self.flush()
    }

    pub fn print_menu(&mut self) -> Result<()> {
        self.line(None, "")?;
        self.line(Some(Colors::HEADER), "Choose an option:")?;
        for entry in [
            "1. Add Task",
            "2. Execute Tasks",
            "3. Pause Task",
            "4. Resume Paused Task(s)",
            "5. Print Task Queue",
            "6. Exit",
            "7. Resume Task",
            "8. Show Metrics",
        ] {
            self.line(None, entry)?;
        }
        self.flush()
    }

    /// Print a prompt without a trailing newline.
    pub fn prompt(&mut self, label: &str) -> Result<()> {
        queue!(self.out, Print(label))?;
        self.flush()
    }

    pub fn print_info(&mut self, message: &str) -> Result<()> {
        self.line(Some(Colors::INFO), message)?;
        self.flush()
    }

    pub fn print_error(&mut self, message: &str) -> Result<()> {
        self.line(Some(Colors::ERROR), message)?;
        self.flush()
    }

    pub fn print_queue(&mut self, tasks: &[TaskSnapshot]) -> Result<()> {
        self.line(Some(Colors::HEADER), "Task Queue (Priority Order):")?;
        if tasks.is_empty() {
            self.line(Some(Colors::DIM), "Queue is currently empty")?;
            return self.flush();
        }
        for task in tasks {
            let mut text = format!(
                "Task ID: {}, Priority: {}, Duration: {} slots, State: {}",
                task.id, task.priority, task.duration, task.state
            );
            if task.remaining != task.duration {
                text.push_str(&format!(", Remaining: {}", task.remaining));
            }
            let color = match task.state {
                TaskState::Paused => Some(Colors::PAUSED),
                TaskState::Runnable => None,
            };
            self.line(color, &text)?;
        }
        self.flush()
    }

    /// Render one progress event. Pass boundaries are reported by [`Self::print_summary`].
    pub fn display_event(&mut self, event: &ProgressEvent) -> Result<()> {
        match event {
            ProgressEvent::TaskStarted { id, priority, .. } => {
                self.line(
                    Some(Colors::PROGRESS),
                    &format!("Executing Task {id} (Priority: {priority})"),
                )?;
            }
            ProgressEvent::SlotCompleted { id, remaining, .. } => {
                self.line(
                    None,
                    &format!("Task {id} executed for 1 time slot. Remaining: {remaining}"),
                )?;
            }
            ProgressEvent::TaskInterrupted { id, remaining } => {
                self.line(
                    Some(Colors::PAUSED),
                    &format!("Task {id} interrupted with {remaining} slot(s) remaining"),
                )?;
            }
            ProgressEvent::PassStarted { .. }
            | ProgressEvent::TaskCompleted { .. }
            | ProgressEvent::PassFinished { .. } => {}
        }
        self.flush()
    }

    pub fn print_summary(&mut self, summary: &RunSummary) -> Result<()> {
        if summary.is_idle() {
            self.line(Some(Colors::DIM), "No runnable tasks.")?;
        } else {
            self.line(
                Some(Colors::INFO),
                &format!(
                    "Executed {} task(s) in {}ms; {} paused task(s) left in queue.",
                    summary.executed.len(),
                    summary.elapsed.as_millis(),
                    summary.paused
                ),
            )?;
        }
        if summary.cancelled {
            self.line(
                Some(Colors::PAUSED),
                &format!("Pass cancelled; {} task(s) requeued.", summary.requeued.len()),
            )?;
        }
        self.flush()
    }

    pub fn print_metrics(&mut self, metrics: &SchedulerMetrics) -> Result<()> {
        let json = serde_json::to_string_pretty(metrics)?;
        self.line(Some(Colors::HEADER), "Scheduler Metrics:")?;
        self.line(None, &json)?;
        self.flush()
    }

    fn line(&mut self, color: Option<Color>, text: &str) -> Result<()> {
        match color.filter(|_| self.color) {
            Some(c) => queue!(
                self.out,
                SetForegroundColor(c),
                Print(text),
                ResetColor,
                Print("\n")
            )?,
            None => queue!(self.out, Print(text), Print("\n"))?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Terminal<&mut Vec<u8>>) -> Result<()>) -> String {
        let mut out = Vec::new();
        {
            let mut terminal = Terminal::new(&mut out, false);
            f(&mut terminal).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_queue_message() {
        let text = render(|t| t.print_queue(&[]));
        assert!(text.contains("Queue is currently empty"));
    }

    #[test]
    fn queue_lines_show_state_and_partial_progress() {
        let tasks = [
            TaskSnapshot { id: 2, priority: 1, duration: 1, remaining: 1, state: TaskState::Runnable },
            TaskSnapshot { id: 1, priority: 5, duration: 4, remaining: 2, state: TaskState::Paused },
        ];
        let text = render(|t| t.print_queue(&tasks));
        assert!(text.contains("Task ID: 2, Priority: 1, Duration: 1 slots, State: runnable\n"));
        assert!(text.contains("Task ID: 1, Priority: 5, Duration: 4 slots, State: paused, Remaining: 2"));
    }

    #[test]
    fn slot_progress_line() {
        let text = render(|t| {
            t.display_event(&ProgressEvent::SlotCompleted { id: 3, completed: 1, remaining: 0 })
        });
        assert_eq!(text, "Task 3 executed for 1 time slot. Remaining: 0\n");
    }

    #[test]
    fn no_escape_codes_without_color() {
        let text = render(|t| t.print_error("boom"));
        assert_eq!(text, "boom\n");
    }

    #[test]
    fn colored_output_wraps_text() {
        let mut out = Vec::new();
        Terminal::new(&mut out, true).print_error("boom").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("boom"));
        assert!(text.starts_with('\u{1b}'));
    }
}
