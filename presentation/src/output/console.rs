//! Console output formatter for taskpilot results

use colored::{ColoredString, Colorize};
use serde::Serialize;
use taskpilot_domain::util::truncate_str;
use taskpilot_domain::{
    ApprovalRequest, ChatResponse, ModelRegistry, QueueHealth, QueueStats, Task, TaskStatus,
};

/// Formats tasks, stats and router results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One line per task, followed by its error or a result preview.
    pub fn format_tasks(tasks: &[Task]) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Tasks"));
        output.push('\n');

        for task in tasks {
            let duration = task
                .duration()
                .map(|d| format!(" {}ms", d.as_millis()))
                .unwrap_or_default();
            let retries = if task.retry_count > 0 {
                format!(" retries {}/{}", task.retry_count, task.max_retries)
            } else {
                String::new()
            };

            output.push_str(&format!(
                "\n{} {} {} [{}]{}{}\n",
                Self::status_label(task.status),
                task.id.as_str().bold(),
                task.task_type,
                task.priority,
                duration.dimmed(),
                retries.yellow()
            ));

            if let Some(error) = &task.error {
                output.push_str(&format!("    {} {}\n", "error:".red(), error));
            } else if let Some(result) = &task.result {
                let preview = serde_json::to_string(result).unwrap_or_default();
                output.push_str(&format!(
                    "    {} {}\n",
                    "result:".dimmed(),
                    truncate_str(&preview, 160)
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    pub fn format_stats(stats: &QueueStats) -> String {
        let health = match stats.health {
            QueueHealth::Healthy => stats.health.as_str().green(),
            QueueHealth::Degraded => stats.health.as_str().yellow(),
            QueueHealth::Critical => stats.health.as_str().red(),
        };

        let mut output = Self::section_header("Queue Stats");
        output.push_str(&format!(
            "  total {}  pending {}  running {}  retrying {}\n",
            stats.total, stats.pending, stats.running, stats.retrying
        ));
        output.push_str(&format!(
            "  completed {}  failed {}  cancelled {}  blocked {}\n",
            stats.completed.to_string().green(),
            stats.failed.to_string().red(),
            stats.cancelled,
            stats.blocked
        ));
        output.push_str(&format!(
            "  success rate {:.1}%  avg duration {:.0}ms  concurrency {}  health {}\n",
            stats.success_rate * 100.0,
            stats.average_duration_ms,
            stats.concurrency_limit,
            health
        ));
        output
    }

    pub fn format_chat(response: &ChatResponse) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} ({})\n",
            "Model:".cyan().bold(),
            response.model,
            response.provider
        ));
        if response.fallback_used {
            output.push_str(&format!(
                "{} {}\n",
                "Fallback:".yellow().bold(),
                response.fallback_reason.as_deref().unwrap_or("previous model failed")
            ));
        }
        output.push_str(&format!("\n{}\n\n", response.content));
        output.push_str(
            &format!(
                "{} tokens, ${:.6}, {}ms",
                response.tokens_used,
                response.cost,
                response.processing_time.as_millis()
            )
            .dimmed()
            .to_string(),
        );
        output.push('\n');
        output
    }

    pub fn format_estimate(model_id: &str, message: &str, tokens: u64, cost: f64) -> String {
        format!(
            "{} {}\n{} {} ({} chars)\n{} ${:.6}\n",
            "Model:".cyan().bold(),
            model_id,
            "Tokens:".cyan().bold(),
            tokens,
            message.chars().count(),
            "Estimated cost:".cyan().bold(),
            cost
        )
    }

    pub fn format_approval(request: &ApprovalRequest) -> String {
        let state = if request.approved {
            format!(
                "approved by {}",
                request.approver.as_deref().unwrap_or("unknown")
            )
            .green()
        } else {
            "awaiting approval".yellow()
        };

        let mut output = Self::section_header("Approval Request");
        output.push_str(&format!("  {} {}\n", "id:".dimmed(), request.id));
        output.push_str(&format!("  {} {}\n", "agent:".dimmed(), request.agent_id));
        output.push_str(&format!("  {} {}\n", "task:".dimmed(), request.task));
        output.push_str(&format!(
            "  {} ${:.4} (x{:.2} complexity)\n",
            "estimated cost:".dimmed(),
            request.estimated_cost,
            request.complexity_multiplier
        ));
        output.push_str(&format!(
            "  {} {}s\n",
            "estimated time:".dimmed(),
            request.estimated_time.as_secs()
        ));
        output.push_str(&format!(
            "  {} {}\n",
            "risk:".dimmed(),
            request.risk_level
        ));
        output.push_str(&format!(
            "  {} {}\n",
            "justification:".dimmed(),
            request.justification
        ));
        output.push_str(&format!("  {} {}\n", "status:".dimmed(), state));
        output
    }

    /// Models with their fallback chains, then agents.
    pub fn format_models(
        registry: &ModelRegistry,
        chain_for: impl Fn(&str) -> Vec<String>,
    ) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Models"));
        output.push('\n');

        for model in registry.models() {
            output.push_str(&format!(
                "\n{} ({}, tier {}, ${}/token, {} max tokens)\n",
                model.id.yellow().bold(),
                model.provider,
                model.tier,
                model.cost_per_token,
                model.max_tokens
            ));
            if !model.capabilities.is_empty() {
                output.push_str(&format!(
                    "    {} {}\n",
                    "capabilities:".dimmed(),
                    model.capabilities.join(", ")
                ));
            }
            output.push_str(&format!(
                "    {} {}\n",
                "fallback:".dimmed(),
                chain_for(&model.id).join(" -> ")
            ));
        }

        output.push_str(&Self::section_header("Agents (approval required)"));
        for agent in registry.agents() {
            output.push_str(&format!(
                "\n{} ({}, {} risk, ~${:.2}/request, max {}s)\n",
                agent.id.magenta().bold(),
                agent.provider,
                agent.risk_level,
                agent.estimated_cost_per_request,
                agent.max_execution_time.as_secs()
            ));
            output.push_str(&Self::indent(&agent.persona, "    "));
            output.push('\n');
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    fn status_label(status: TaskStatus) -> ColoredString {
        let label = format!("{:<9}", status.as_str());
        match status {
            TaskStatus::Completed => label.green(),
            TaskStatus::Failed => label.red(),
            TaskStatus::Retrying => label.yellow(),
            TaskStatus::Running => label.cyan(),
            TaskStatus::Cancelled => label.dimmed(),
            TaskStatus::Pending => label.normal(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
