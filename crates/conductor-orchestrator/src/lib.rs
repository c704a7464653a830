//! Task/agent allocation for Conductor.
//!
//! Two allocation styles live here. The simple [`Orchestrator`] matches each
//! pending task to the first idle agent holding the capability the task needs,
//! in one synchronous pass. The [`ScoredOrchestrator`] ranks candidate agents
//! by capability match, efficiency and availability, and the [`Coordinator`]
//! drives it from a tokio task.
//!
//! # Main types
//!
//! - [`Orchestrator`]: Registry + ordered queue + single assignment pass.
//! - [`OrchestrationConfig`]: Agent roster, priority lists and capability map.
//! - [`StatusReport`]: Text and JSON snapshot of agents and tasks.
//! - [`ScoredOrchestrator`]: Weighted agent selection and performance records.
//! - [`Coordinator`]: Periodic scored distribution with shutdown and backoff.

/// Orchestration configuration file.
pub mod config;
/// Async coordinator loop over the scored orchestrator.
pub mod coordinator;
/// Simple orchestrator engine.
pub mod engine;
/// Capability matching.
pub mod matcher;
/// Built-in scored agent roster.
pub mod profiles;
/// Agent registry.
pub mod registry;
/// Status report.
pub mod report;
/// Scored allocation variant.
pub mod scored;
/// Ordered task queue.
pub mod task_queue;
/// Agents, tasks and their status enums.
pub mod types;

pub use config::{AgentConfig, ConfigSource, OrchestrationConfig, TaskPriorities};
pub use coordinator::{Coordinator, CoordinatorSettings, CoordinatorStats, TickHook};
pub use engine::{Assignment, AssignmentOutcome, ExecutionSummary, Orchestrator, TaskExecutor};
pub use matcher::{find_available_agent, match_task, MatchFailure};
pub use profiles::default_scored_profiles;
pub use registry::AgentRegistry;
pub use report::{AgentLine, StatusReport, TaskLine};
pub use scored::{
    AgentPerformance, Opportunity, PerformanceReport, ScoredAgent, ScoredAgentStatus,
    ScoredOrchestrator, ScoredPriority, ScoredTask, ScoredTaskStatus, SystemState,
    DEFAULT_MAX_CONCURRENT,
};
pub use task_queue::TaskQueue;
pub use types::{Agent, AgentStatus, Task, TaskPriority, TaskStatus};
