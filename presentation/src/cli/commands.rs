//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored human-readable output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for taskpilot
#[derive(Parser, Debug)]
#[command(name = "taskpilot")]
#[command(author, version, about = "Background task scheduler with fallback-aware AI model routing")]
#[command(long_about = r#"
taskpilot runs batches of background tasks with priorities, dependencies,
retries and timeouts, and routes AI requests through model fallback chains.

Configuration files are loaded from (in priority order):
1. TASKPILOT_* environment variables (e.g. TASKPILOT_QUEUE__CONCURRENCY_LIMIT=2)
2. --config <path>     Explicit config file
3. ./taskpilot.toml    Project-level config
4. ~/.config/taskpilot/config.toml   Global config

Example:
  taskpilot run tasks.json
  taskpilot chat -m claude-3-5-sonnet "Summarize the release notes"
  taskpilot --simulate-failure gpt-4o chat "What changed?"
  taskpilot agent research-agent "Survey vector databases" --approve --approver alice
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Make the offline gateway fail every request to MODEL (repeatable)
    #[arg(long, value_name = "MODEL", global = true)]
    pub simulate_failure: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a JSON batch of tasks and run it until every task settles
    Run {
        /// JSON array of task specs; `key` and `depends_on` link tasks within the file
        file: PathBuf,

        /// Owner assigned to tasks that do not name one
        #[arg(long, value_name = "ID")]
        owner: Option<String>,
    },

    /// Send one message through the model fallback chain
    Chat {
        message: String,

        /// Preferred model (defaults to the configured analysis model)
        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Maximum tokens in the answer
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Estimate the cost of sending a message to a model
    Estimate {
        message: String,

        #[arg(short, long, value_name = "MODEL")]
        model: Option<String>,
    },

    /// Request an approval-gated agent run, optionally approving it
    Agent {
        /// Agent id (see `taskpilot models`)
        agent_id: String,

        /// Task description for the agent
        task: String,

        /// Why the agent is needed
        #[arg(long)]
        justification: Option<String>,

        /// Approve and execute the request immediately
        #[arg(long)]
        approve: bool,

        /// Name recorded as the approver
        #[arg(long, value_name = "NAME", default_value = "cli")]
        approver: String,
    },

    /// List registered models, agents and fallback chains
    Models,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_with_global_flags() {
        let cli = Cli::try_parse_from([
            "taskpilot",
            "-vv",
            "chat",
            "hello",
            "-m",
            "gpt-4o",
            "--simulate-failure",
            "gpt-4o",
            "--simulate-failure",
            "claude-3-5-sonnet",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.simulate_failure, vec!["gpt-4o", "claude-3-5-sonnet"]);
        match cli.command {
            Some(Command::Chat { message, model, .. }) => {
                assert_eq!(message, "hello");
                assert_eq!(model.as_deref(), Some("gpt-4o"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_agent_defaults() {
        let cli =
            Cli::try_parse_from(["taskpilot", "agent", "research-agent", "look into it"]).unwrap();
        match cli.command {
            Some(Command::Agent {
                approve, approver, ..
            }) => {
                assert!(!approve);
                assert_eq!(approver, "cli");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_show_config_without_subcommand() {
        let cli = Cli::try_parse_from(["taskpilot", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
        assert_eq!(cli.output, OutputFormat::Text);
    }
}
