//! `conductor`: command-line entry point for orchestration, monitoring,
//! the tool server and the memory store.

mod commands;
mod settings;
mod worker_hook;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{parse_task_spec, MemoryCommand, TaskSpec};
use settings::Settings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conductor", version, about = "Conductor: task orchestration for worker agents")]
struct Cli {
    /// Path to the settings file
    #[arg(short, long, global = true, default_value = "conductor.toml")]
    config: PathBuf,

    /// Log output format (logs always go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Overrides `data_dir` from the settings file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Overrides `output_dir` from the settings file
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default settings and orchestration config files
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Queue a priority tier, run one assignment pass and print the report
    Run {
        /// immediate, short_term, medium_term or all (default: immediate)
        #[arg(long)]
        tier: Option<String>,
        /// Run the worker agents for assigned tasks and complete them
        #[arg(long)]
        execute: bool,
    },
    /// Run the scored coordinator loop with monitoring
    Coordinate {
        /// Scored task as `kind[:priority[:cap,cap]]`; repeatable.
        /// Defaults to every task in the orchestration config.
        #[arg(long = "task", value_parser = parse_task_spec)]
        tasks: Vec<TaskSpec>,
        /// Stop after this many ticks (default: until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Sample host metrics and print a performance summary
    Monitor {
        /// Stop after this many samples (default: until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,
        /// Seconds between samples
        #[arg(long)]
        interval: Option<u64>,
        /// Add randomly simulated agent metrics (needs the `demo` feature)
        #[arg(long)]
        demo: bool,
    },
    /// Serve memory and orchestration tools over stdin/stdout
    ServeMcp {
        /// Memory database path (overrides settings)
        #[arg(long)]
        memory_db: Option<PathBuf>,
        /// Do not run worker agents from the orchestrate tool
        #[arg(long)]
        no_execute: bool,
    },
    /// Read and write the persistent memory store
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Print a stored value
    Get { key: String },
    /// Store a value (parsed as JSON when possible)
    Set {
        key: String,
        value: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        expires_hours: Option<u64>,
        #[arg(long)]
        session: Option<String>,
    },
    /// List the entries of a category
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a stored value
    Delete { key: String },
    /// Print storage statistics
    Stats,
    /// Remove expired entries
    Cleanup,
}

impl From<MemoryAction> for MemoryCommand {
    fn from(action: MemoryAction) -> Self {
        match action {
            MemoryAction::Get { key } => MemoryCommand::Get { key },
            MemoryAction::Set {
                key,
                value,
                category,
                expires_hours,
                session,
            } => MemoryCommand::Set {
                key,
                value,
                category,
                expires_hours,
                session,
            },
            MemoryAction::List { category } => MemoryCommand::List { category },
            MemoryAction::Delete { key } => MemoryCommand::Delete { key },
            MemoryAction::Stats => MemoryCommand::Stats,
            MemoryAction::Cleanup => MemoryCommand::Cleanup,
        }
    }
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let mut settings = Settings::load(&cli.config).await?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }

    match cli.command {
        Commands::Init { force } => commands::init(&settings, &cli.config, force).await,
        Commands::Run { tier, execute } => commands::run(&settings, tier.as_deref(), execute).await,
        Commands::Coordinate { tasks, ticks } => commands::coordinate(&settings, tasks, ticks).await,
        Commands::Monitor {
            ticks,
            interval,
            demo,
        } => commands::monitor(&settings, ticks, interval, demo).await,
        Commands::ServeMcp {
            memory_db,
            no_execute,
        } => {
            if memory_db.is_some() {
                settings.mcp.memory_db = memory_db;
            }
            commands::serve_mcp(&settings, !no_execute).await
        }
        Commands::Memory { action } => commands::memory(&settings, action.into()).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use conductor_orchestrator::ScoredPriority;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_coordinate_collects_tasks() {
        let cli = Cli::try_parse_from([
            "conductor",
            "coordinate",
            "--task",
            "implement_basic_testing:high",
            "--task",
            "audit",
            "--ticks",
            "3",
        ])
        .unwrap();
        let Commands::Coordinate { tasks, ticks } = cli.command else {
            panic!("expected coordinate");
        };
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].priority, ScoredPriority::High);
        assert_eq!(ticks, Some(3));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "conductor",
            "memory",
            "stats",
            "--log-format",
            "json",
            "--config",
            "other.toml",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }

    #[test]
    fn test_bad_task_spec_rejected() {
        assert!(Cli::try_parse_from(["conductor", "coordinate", "--task", "x:urgent"]).is_err());
    }
}
