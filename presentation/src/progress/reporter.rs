//! Progress reporting for queued tasks
//!
//! Both reporters implement the [`TaskNotifier`] port, so they receive the
//! same updates the lifecycle dispatcher sends to every other notifier.

use async_trait::async_trait;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use taskpilot_application::ports::notifier::{NotifyError, TaskNotifier};
use taskpilot_domain::util::truncate_str;
use taskpilot_domain::{TaskId, TaskStatus};

/// Reports task progress with one bar per task
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<TaskId, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn task_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn bar_for(&self, task_id: &TaskId) -> ProgressBar {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        bars.entry(task_id.clone())
            .or_insert_with(|| {
                let pb = self.multi.add(ProgressBar::new(100));
                pb.set_style(Self::task_style());
                pb.set_prefix(truncate_str(task_id.as_str(), 8).to_string());
                pb
            })
            .clone()
    }

    fn status_message(status: TaskStatus) -> String {
        match status {
            TaskStatus::Completed => format!("{} completed", "v".green()),
            TaskStatus::Failed => format!("{} failed", "x".red()),
            TaskStatus::Cancelled => format!("{} cancelled", "-".dimmed()),
            TaskStatus::Retrying => format!("{} retrying", "~".yellow()),
            TaskStatus::Running => "running".to_string(),
            TaskStatus::Pending => "pending".to_string(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskNotifier for ProgressReporter {
    async fn notify_task_update(
        &self,
        _owner_id: &str,
        task_id: &TaskId,
        status: TaskStatus,
        progress: Option<u8>,
    ) -> Result<(), NotifyError> {
        let pb = self.bar_for(task_id);
        if let Some(p) = progress {
            pb.set_position(u64::from(p));
        }

        let message = Self::status_message(status);
        if status.is_terminal() {
            if status == TaskStatus::Completed {
                pb.set_position(100);
            }
            pb.finish_with_message(message);
            self.bars
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(task_id);
        } else {
            pb.set_message(message);
            pb.tick();
        }
        Ok(())
    }

    async fn notify_agent_completion(
        &self,
        _owner_id: &str,
        agent_id: &str,
        response: &str,
    ) -> Result<(), NotifyError> {
        self.multi
            .println(format!(
                "{} {} {}",
                "*".magenta(),
                agent_id.bold(),
                truncate_str(response, 80)
            ))
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

/// Simple text-based progress (no fancy UI)
///
/// Prints status changes only; progress percentages are skipped.
pub struct SimpleProgress;

#[async_trait]
impl TaskNotifier for SimpleProgress {
    async fn notify_task_update(
        &self,
        _owner_id: &str,
        task_id: &TaskId,
        status: TaskStatus,
        progress: Option<u8>,
    ) -> Result<(), NotifyError> {
        if progress.is_none() {
            println!(
                "  {} {}",
                task_id.as_str().dimmed(),
                ProgressReporter::status_message(status)
            );
        }
        Ok(())
    }

    async fn notify_agent_completion(
        &self,
        _owner_id: &str,
        agent_id: &str,
        response: &str,
    ) -> Result<(), NotifyError> {
        println!("  {} {} {}", "*".magenta(), agent_id, truncate_str(response, 80));
        Ok(())
    }
}
