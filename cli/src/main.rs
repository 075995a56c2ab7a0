//! CLI entrypoint for taskpilot
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod batch;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use taskpilot_application::{
    AgentExecutionHandler, AgentRequestOptions, AiAnalysisHandler, AiRouter, DataAnalysisHandler,
    EmailProcessingHandler, EventSink, LifecycleDispatcher, QueueConfig, ReportGenerationHandler,
    SystemMaintenanceHandler, TaskNotifier, TaskPersister, TaskQueue,
};
use taskpilot_domain::{
    ChatMessage, ChatOptions, ModelRegistry, NewTask, QueueStats, Task, TaskId, TaskType,
    estimate_tokens,
};
use taskpilot_infrastructure::{
    ConfigLoader, FanoutNotifier, FileConfig, FileLoggingConfig, InMemoryTaskStore,
    JsonlTaskPersister, OfflineGateway, TracingNotifier,
};
use taskpilot_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // === Configuration ===
    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    let _log_guard = init_tracing(cli.verbose, &file_config.logging);
    info!("Starting taskpilot");

    let registry = ModelRegistry::default();
    for issue in file_config.validate(&registry) {
        warn!("{}", issue);
    }
    let app_config = file_config.to_app_config(&registry);

    // === Dependency Injection ===
    let gateway = cli.simulate_failure.iter().fold(
        build_gateway(&file_config),
        |gateway, model| gateway.with_failing_model(model.as_str()),
    );
    let router = Arc::new(AiRouter::new(
        registry,
        Arc::new(gateway),
        app_config.router.clone(),
    ));

    let show_progress = !cli.quiet && cli.output == OutputFormat::Text;
    let services = Services {
        router,
        queue_config: app_config.queue,
        persister: build_persister(&file_config)?,
        notifier: build_notifier(show_progress),
    };

    match command {
        Command::Run { file, owner } => {
            run_batch(&services, &file, owner.as_deref(), cli.output).await
        }
        Command::Chat {
            message,
            model,
            temperature,
            max_tokens,
        } => {
            let model = model.unwrap_or_else(|| services.router.config().analysis_model.clone());
            let options = ChatOptions {
                temperature,
                max_tokens,
                user_id: None,
            };
            let response = services
                .router
                .chat_completion(&[ChatMessage::user(message)], &model, &options)
                .await?;
            match cli.output {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_chat(&response)),
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&response)),
            }
            Ok(())
        }
        Command::Estimate { message, model } => {
            let model = model.unwrap_or_else(|| services.router.config().analysis_model.clone());
            let cost = services.router.estimate_message_cost(&message, &model)?;
            let tokens = estimate_tokens(&message);
            match cli.output {
                OutputFormat::Text => print!(
                    "{}",
                    ConsoleFormatter::format_estimate(&model, &message, tokens, cost)
                ),
                OutputFormat::Json => println!(
                    "{}",
                    ConsoleFormatter::format_json(&serde_json::json!({
                        "model": model,
                        "tokens": tokens,
                        "estimated_cost": cost,
                    }))
                ),
            }
            Ok(())
        }
        Command::Agent {
            agent_id,
            task,
            justification,
            approve,
            approver,
        } => {
            let request = AgentCommand {
                agent_id,
                task,
                justification,
                approve,
                approver,
            };
            run_agent(&services, request, cli.output).await
        }
        Command::Models => {
            let router = &services.router;
            match cli.output {
                OutputFormat::Text => print!(
                    "{}",
                    ConsoleFormatter::format_models(router.registry(), |id| {
                        router.fallback_chain(id)
                    })
                ),
                OutputFormat::Json => {
                    let chains: serde_json::Map<String, serde_json::Value> = router
                        .registry()
                        .models()
                        .iter()
                        .map(|m| (m.id.clone(), serde_json::json!(router.fallback_chain(&m.id))))
                        .collect();
                    println!(
                        "{}",
                        ConsoleFormatter::format_json(&serde_json::json!({
                            "models": router.registry().models(),
                            "agents": router.registry().agents(),
                            "fallback_chains": chains,
                        }))
                    );
                }
            }
            Ok(())
        }
    }
}

/// Long-lived collaborators shared by every command.
struct Services {
    router: Arc<AiRouter>,
    queue_config: QueueConfig,
    persister: Arc<dyn TaskPersister>,
    notifier: Arc<dyn TaskNotifier>,
}

impl Services {
    /// Submit tasks through `submit`, run the queue until everything settles,
    /// then shut it down and drain the lifecycle events.
    async fn run_queue(
        &self,
        submit: impl FnOnce(&TaskQueue) -> Vec<TaskId>,
    ) -> (Vec<Task>, QueueStats) {
        let (events, receiver) = EventSink::channel();
        let dispatcher =
            LifecycleDispatcher::new(self.persister.clone(), self.notifier.clone()).spawn(receiver);

        let queue = TaskQueue::builder(self.queue_config.clone())
            .handler(Arc::new(AiAnalysisHandler::new(self.router.clone())))
            .handler(Arc::new(AgentExecutionHandler::new(self.router.clone())))
            .handler(Arc::new(DataAnalysisHandler::new(self.router.clone())))
            .handler(Arc::new(ReportGenerationHandler::new(self.router.clone())))
            .handler(Arc::new(SystemMaintenanceHandler::new(self.router.clone())))
            .handler(Arc::new(EmailProcessingHandler::new()))
            .build(events);

        let ids = submit(&queue);
        queue.spawn_scheduler();
        queue.wait_until_settled().await;
        queue.shutdown().await;

        let tasks: Vec<Task> = ids.iter().filter_map(|id| queue.get_task(id)).collect();
        let stats = queue.get_stats();
        // The dispatcher stops once every event sender is gone.
        drop(queue);
        if let Err(e) = dispatcher.await {
            warn!("Lifecycle dispatcher stopped abnormally: {}", e);
        }
        (tasks, stats)
    }
}

async fn run_batch(
    services: &Services,
    file: &Path,
    owner: Option<&str>,
    output: OutputFormat,
) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let entries = batch::parse_batch(&json)
        .with_context(|| format!("Invalid task batch {}", file.display()))?;
    info!("Submitting {} tasks from {}", entries.len(), file.display());

    let (tasks, stats) = services
        .run_queue(|queue| batch::submit_batch(queue, entries, owner))
        .await;

    match output {
        OutputFormat::Text => {
            print!("{}", ConsoleFormatter::format_tasks(&tasks));
            print!("{}", ConsoleFormatter::format_stats(&stats));
        }
        OutputFormat::Json => println!(
            "{}",
            ConsoleFormatter::format_json(&serde_json::json!({
                "tasks": tasks,
                "stats": stats,
            }))
        ),
    }
    Ok(())
}

struct AgentCommand {
    agent_id: String,
    task: String,
    justification: Option<String>,
    approve: bool,
    approver: String,
}

async fn run_agent(services: &Services, command: AgentCommand, output: OutputFormat) -> Result<()> {
    let AgentCommand {
        agent_id,
        task,
        justification,
        approve,
        approver,
    } = command;
    let mut request = services.router.request_agent_execution(
        &agent_id,
        &task,
        AgentRequestOptions {
            justification,
            requested_by: Some(approver.clone()),
        },
    )?;

    if !approve {
        match output {
            OutputFormat::Text => {
                print!("{}", ConsoleFormatter::format_approval(&request));
                println!("\nRe-run with --approve to execute this request.");
            }
            OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&request)),
        }
        return Ok(());
    }

    let hard_limit = services
        .router
        .registry()
        .agent(&agent_id)
        .map(|agent| agent.max_execution_time)
        .unwrap_or(request.estimated_time);

    request.approve(approver.as_str());
    let spec = NewTask::new(TaskType::AgentExecution)
        .with_owner(approver.as_str())
        .with_max_retries(0)
        .with_timeout(hard_limit)
        .with_payload(serde_json::json!({
            "approval": request,
            "approved": true,
            "approver_id": approver,
        }));

    let (tasks, _) = services
        .run_queue(|queue| vec![queue.add_task(spec)])
        .await;
    let Some(task) = tasks.into_iter().next() else {
        bail!("Agent task disappeared from the queue");
    };

    match output {
        OutputFormat::Text => {
            print!("{}", ConsoleFormatter::format_approval(&request));
            print!("{}", ConsoleFormatter::format_tasks(std::slice::from_ref(&task)));
        }
        OutputFormat::Json => println!(
            "{}",
            ConsoleFormatter::format_json(&serde_json::json!({
                "approval": request,
                "task": task,
            }))
        ),
    }
    Ok(())
}

fn build_gateway(config: &FileConfig) -> OfflineGateway {
    config.gateway.failing_models.iter().fold(
        OfflineGateway::new().with_latency(Duration::from_millis(config.gateway.latency_ms)),
        |gateway, model| gateway.with_failing_model(model.as_str()),
    )
}

fn build_persister(config: &FileConfig) -> Result<Arc<dyn TaskPersister>> {
    Ok(match &config.persistence.jsonl {
        Some(path) => {
            let persister = JsonlTaskPersister::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            info!("Persisting tasks to {}", path.display());
            Arc::new(persister)
        }
        None => Arc::new(InMemoryTaskStore::new()),
    })
}

fn build_notifier(show_progress: bool) -> Arc<dyn TaskNotifier> {
    let mut notifiers: Vec<Arc<dyn TaskNotifier>> = vec![Arc::new(TracingNotifier)];
    if show_progress {
        if std::io::stderr().is_terminal() {
            notifiers.push(Arc::new(ProgressReporter::new()));
        } else {
            notifiers.push(Arc::new(SimpleProgress));
        }
    }
    Arc::new(FanoutNotifier::new(notifiers))
}

/// Initialize logging: `-v` count wins over `RUST_LOG`, which wins over the
/// configured level. The returned guard flushes the log file on drop.
fn init_tracing(verbose: u8, config: &FileLoggingConfig) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.parse_level().0.as_deref().unwrap_or("warn"))
        }),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match &config.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "taskpilot.log".to_string());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
