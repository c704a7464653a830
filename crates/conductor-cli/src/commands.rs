//! One function per subcommand.

use crate::settings::Settings;
use crate::worker_hook::WorkerHook;
use anyhow::{anyhow, bail};
use chrono::Utc;
use conductor_agents::WorkerPool;
use conductor_mcp::McpServer;
use conductor_memory::{MemoryStore, NewMemory, SqliteMemoryStore, DEFAULT_CATEGORY};
use conductor_monitor::{MonitorRunner, MonitorSettings, OrchestratorSource, SystemSource};
use conductor_orchestrator::{
    default_scored_profiles, ConfigSource, Coordinator, OrchestrationConfig, Orchestrator,
    ScoredOrchestrator, ScoredPriority, TaskExecutor, TaskPriority,
};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// A scored task given on the command line as `kind[:priority[:cap,cap]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Task kind, e.g. `implement_basic_testing`.
    pub kind: String,
    /// Defaults to medium.
    pub priority: ScoredPriority,
    /// Required capabilities.
    pub required: Vec<String>,
}

/// Clap value parser for `--task`.
pub fn parse_task_spec(raw: &str) -> Result<TaskSpec, String> {
    let mut parts = raw.splitn(3, ':');
    let kind = parts.next().unwrap_or_default().trim();
    if kind.is_empty() {
        return Err("task kind must not be empty".to_string());
    }
    let priority = match parts.next().map(str::trim) {
        None | Some("") => ScoredPriority::Medium,
        Some(p) => p.parse()?,
    };
    let required = parts
        .next()
        .map(|caps| {
            caps.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(TaskSpec {
        kind: kind.to_string(),
        priority,
        required,
    })
}

/// Scored priority used for a tier of the simple priority lists.
fn tier_priority(tier: TaskPriority) -> ScoredPriority {
    match tier {
        TaskPriority::Immediate => ScoredPriority::Critical,
        TaskPriority::ShortTerm => ScoredPriority::High,
        TaskPriority::MediumTerm => ScoredPriority::Medium,
    }
}

/// Scored tasks for every configured priority list entry.
pub fn tasks_from_config(config: &OrchestrationConfig) -> Vec<TaskSpec> {
    TaskPriority::ALL
        .iter()
        .flat_map(|&tier| {
            config.task_priorities.tier(tier).iter().map(move |name| TaskSpec {
                kind: name.clone(),
                priority: tier_priority(tier),
                required: config
                    .required_capability(name)
                    .map(|c| vec![c.to_string()])
                    .unwrap_or_default(),
            })
        })
        .collect()
}

async fn load_orchestration(settings: &Settings) -> OrchestrationConfig {
    let path = &settings.orchestrator.config_path;
    let (config, source) = OrchestrationConfig::load_or_init(path).await;
    if source == ConfigSource::FallbackDefault {
        warn!(path = %path.display(), "Using the default orchestration config");
    }
    config
}

/// Flip the watch channel on Ctrl-C.
fn shutdown_on_ctrl_c(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            let _ = tx.send(true);
        }
    });
}

/// Create the data and output dirs and write default settings and orchestration config.
pub async fn init(settings: &Settings, settings_path: &Path, force: bool) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&settings.data_dir).await?;
    tokio::fs::create_dir_all(&settings.output_dir).await?;

    if force || !settings_path.exists() {
        tokio::fs::write(settings_path, settings.to_toml()?).await?;
        println!("Wrote {}", settings_path.display());
    }

    let config_path = &settings.orchestrator.config_path;
    if force || !config_path.exists() {
        OrchestrationConfig::default().save(config_path).await?;
        println!("Wrote {}", config_path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", config_path.display());
    }
    Ok(())
}

/// Queue a tier (or run the full orchestration cycle), optionally execute, then print and save the status report.
pub async fn run(settings: &Settings, tier: Option<&str>, execute: bool) -> anyhow::Result<()> {
    let config = load_orchestration(settings).await;
    let mut orchestrator = Orchestrator::new(config)?;

    let (outcome, _) = match tier {
        None => orchestrator.orchestrate(),
        Some("all") => {
            orchestrator.add_all_priority_tasks();
            (orchestrator.assign_pending(), orchestrator.report())
        }
        Some(name) => {
            let tier: TaskPriority = name.parse().map_err(|e: String| anyhow!(e))?;
            orchestrator.add_priority_tier(tier);
            (orchestrator.assign_pending(), orchestrator.report())
        }
    };
    for assignment in &outcome.assigned {
        println!("assigned {} -> {}", assignment.task_name, assignment.agent);
    }

    if execute {
        let pool = WorkerPool::with_defaults(&settings.output_dir);
        let summary = orchestrator.execute_assigned(&pool).await;
        for artifact in &summary.artifacts {
            println!("wrote {}", artifact.path.display());
        }
        for (id, message) in &summary.failures {
            println!("failed {id}: {message}");
        }
    }

    let report = orchestrator.report();
    println!("{report}");
    let path = settings.reports().save("orchestration_status", &report).await?;
    info!(path = %path.display(), "Status report saved");
    orchestrator.check_invariants()?;
    Ok(())
}

/// Run the scored coordinator with monitoring until `ticks` or Ctrl-C, then save both reports.
pub async fn coordinate(
    settings: &Settings,
    tasks: Vec<TaskSpec>,
    ticks: Option<u64>,
) -> anyhow::Result<()> {
    let mut scored = ScoredOrchestrator::with_agents(
        settings.orchestrator.max_concurrent_tasks_per_agent,
        default_scored_profiles(),
    )?;
    let tasks = if tasks.is_empty() {
        tasks_from_config(&load_orchestration(settings).await)
    } else {
        tasks
    };
    for task in tasks {
        scored.create_task(task.kind, task.priority, task.required);
    }

    let hook = WorkerHook::new(WorkerPool::with_defaults(&settings.output_dir));
    let coordinator = Coordinator::new(scored, settings.orchestrator.coordinator_settings(ticks))
        .with_hook(Arc::new(hook));
    let state = coordinator.state();

    let monitor_settings = MonitorSettings {
        max_ticks: None,
        ..settings.monitor.clone()
    };
    let runner = MonitorRunner::new(monitor_settings)
        .add_source(Arc::new(OrchestratorSource::new(Arc::clone(&state))))
        .add_source(Arc::new(SystemSource::new()));
    let monitor = runner.monitor();

    let (tx, rx) = watch::channel(false);
    let mut coordinator_handle = coordinator.start(rx.clone());
    let monitor_handle = runner.start(rx);

    let stats = tokio::select! {
        stats = &mut coordinator_handle => stats?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            let _ = tx.send(true);
            coordinator_handle.await?
        }
    };
    let _ = tx.send(true);
    let monitor_stats = monitor_handle.await?;

    let store = settings.reports();
    let performance = state.read().await.performance_report();
    store
        .save("orchestration_performance_report", &performance)
        .await?;
    let summary = monitor.read().await.summary(Utc::now());
    store.save("performance_summary", &summary).await?;

    println!("{}", serde_json::to_string_pretty(&performance.system_overview)?);
    println!(
        "ticks: {} (failed {}), tasks assigned: {}, monitor samples: {}, alerts: {}",
        stats.ticks,
        stats.failed_ticks,
        stats.tasks_assigned,
        monitor_stats.samples,
        monitor_stats.alerts
    );
    Ok(())
}

/// Sample metrics until `ticks` or Ctrl-C and print the summary.
pub async fn monitor(
    settings: &Settings,
    ticks: Option<u64>,
    interval_secs: Option<u64>,
    demo: bool,
) -> anyhow::Result<()> {
    let monitor_settings = MonitorSettings {
        interval_secs: interval_secs.unwrap_or(settings.monitor.interval_secs),
        max_ticks: ticks,
        ..settings.monitor.clone()
    };
    #[allow(unused_mut)]
    let mut runner =
        MonitorRunner::new(monitor_settings).add_source(Arc::new(SystemSource::new()));

    if demo {
        #[cfg(feature = "demo")]
        {
            warn!("Demo mode: agent and communication metrics are randomly simulated");
            runner = runner.add_source(Arc::new(conductor_monitor::SimulatedSource::all()));
        }
        #[cfg(not(feature = "demo"))]
        {
            bail!("--demo needs a build with the `demo` feature");
        }
    }

    let monitor = runner.monitor();
    let (tx, rx) = watch::channel(false);
    let handle = runner.start(rx);
    if ticks.is_none() {
        shutdown_on_ctrl_c(tx);
    }
    let stats = handle.await?;

    let summary = monitor.read().await.summary(Utc::now());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    let path = settings.reports().save("performance_summary", &summary).await?;
    info!(
        path = %path.display(),
        ticks = stats.ticks,
        alerts = stats.alerts,
        "Performance summary saved"
    );
    Ok(())
}

/// Serve the tool server on stdin/stdout until input closes.
pub async fn serve_mcp(settings: &Settings, execute: bool) -> anyhow::Result<()> {
    let store: Arc<dyn MemoryStore> =
        Arc::new(SqliteMemoryStore::open(settings.memory_db_path()).await?);
    let orchestrator = Arc::new(Mutex::new(Orchestrator::new(
        load_orchestration(settings).await,
    )?));
    let executor: Option<Arc<dyn TaskExecutor>> = if execute {
        Some(Arc::new(WorkerPool::with_defaults(&settings.output_dir)))
    } else {
        None
    };

    let server = McpServer::with_default_tools(store, orchestrator, executor);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stats = server.serve(stdin, tokio::io::stdout()).await?;
    info!(
        requests = stats.requests,
        parse_errors = stats.parse_errors,
        "Tool server finished"
    );
    Ok(())
}

/// `memory` subcommands.
#[derive(Debug, Clone)]
pub enum MemoryCommand {
    /// Print one value.
    Get { key: String },
    /// Store a value, optionally expiring.
    Set {
        key: String,
        value: String,
        category: Option<String>,
        expires_hours: Option<u64>,
        session: Option<String>,
    },
    /// List a category (or every entry).
    List { category: Option<String> },
    /// Remove one key.
    Delete { key: String },
    /// Print store statistics.
    Stats,
    /// Drop expired entries.
    Cleanup,
}

/// A value given on the command line: JSON when it parses, a string otherwise.
pub fn parse_cli_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run one `memory` subcommand against the configured database.
pub async fn memory(settings: &Settings, command: MemoryCommand) -> anyhow::Result<()> {
    let store = SqliteMemoryStore::open(settings.memory_db_path()).await?;
    match command {
        MemoryCommand::Get { key } => match store.retrieve(&key).await? {
            Some(entry) => println!("{}", serde_json::to_string_pretty(&entry.value)?),
            None => bail!("Memory not found: {key}"),
        },
        MemoryCommand::Set {
            key,
            value,
            category,
            expires_hours,
            session,
        } => {
            let mut memory = NewMemory::new(&key, parse_cli_value(&value))
                .category(category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()))
                .expires_in_hours(expires_hours.unwrap_or(0))?;
            if let Some(session) = session {
                memory = memory.session(session);
            }
            store.store(memory).await?;
            println!("Memory stored successfully: {key}");
        }
        MemoryCommand::List { category } => {
            let category = category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            for entry in store.list(&category).await? {
                println!("{}\t{}\t{}", entry.key, entry.value_type.as_str(), entry.value);
            }
        }
        MemoryCommand::Delete { key } => {
            if store.delete(&key).await? {
                println!("Memory deleted: {key}");
            } else {
                println!("Memory not found: {key}");
            }
        }
        MemoryCommand::Stats => {
            println!("{}", serde_json::to_string_pretty(&store.stats().await?)?);
        }
        MemoryCommand::Cleanup => {
            let removed = store.cleanup_expired().await?;
            println!("Memory cleanup completed: {removed} expired entries removed");
        }
    }
    Ok(())
}
