use crate::protocol::ToolDef;
use crate::tool::{parse_args, Tool};
use async_trait::async_trait;
use conductor_core::{ConductorError, ConductorResult};
use conductor_orchestrator::{Orchestrator, TaskExecutor, TaskPriority};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Orchestrator shared between the tool server's tools.
pub type SharedOrchestrator = Arc<Mutex<Orchestrator>>;

#[derive(Deserialize, Default)]
struct OrchestrateArgs {
    /// Explicit task names to queue.
    #[serde(default)]
    tasks: Option<Vec<String>>,
    /// Tier for `tasks`, or the tier to queue from the priority lists.
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    execute: bool,
}

fn parse_tier(raw: Option<&str>) -> ConductorResult<Option<TaskPriority>> {
    raw.map(|s| s.parse::<TaskPriority>().map_err(ConductorError::Mcp))
        .transpose()
}

/// `orchestrate`: queue work, run one assignment pass, optionally execute it.
pub struct OrchestrateTool {
    definition: ToolDef,
    orchestrator: SharedOrchestrator,
    executor: Option<Arc<dyn TaskExecutor>>,
}

impl OrchestrateTool {
    /// Tool over a shared orchestrator. Without an executor, `execute: true` is rejected.
    pub fn new(orchestrator: SharedOrchestrator, executor: Option<Arc<dyn TaskExecutor>>) -> Self {
        Self {
            definition: ToolDef::new(
                "orchestrate",
                "Queue tasks and assign them to idle agents by capability",
                json!({
                    "type": "object",
                    "properties": {
                        "tasks": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "Task names to queue; defaults to the configured tier"
                        },
                        "priority": {
                            "type": "string",
                            "enum": ["immediate", "short_term", "medium_term"],
                            "default": "immediate"
                        },
                        "execute": {
                            "type": "boolean",
                            "default": false,
                            "description": "Run the assigned tasks and complete them"
                        }
                    }
                }),
            ),
            orchestrator,
            executor,
        }
    }
}

#[async_trait]
impl Tool for OrchestrateTool {
    fn definition(&self) -> &ToolDef {
        &self.definition
    }

    async fn call(&self, arguments: Value) -> ConductorResult<Value> {
        let args: OrchestrateArgs = parse_args(&self.definition.name, arguments)?;
        let tier = parse_tier(args.priority.as_deref())?;

        let mut orchestrator = self.orchestrator.lock().await;
        let (outcome, report) = match (args.tasks, tier) {
            (Some(tasks), tier) => {
                let tier = tier.unwrap_or(TaskPriority::Immediate);
                for task in tasks {
                    orchestrator.add_task(task, tier);
                }
                let outcome = orchestrator.assign_pending();
                (outcome, orchestrator.report())
            }
            (None, Some(tier)) => {
                orchestrator.add_priority_tier(tier);
                let outcome = orchestrator.assign_pending();
                (outcome, orchestrator.report())
            }
            (None, None) => orchestrator.orchestrate(),
        };

        let mut response = json!({
            "assigned": outcome.assigned,
            "unknown_tasks": outcome.unknown_tasks,
            "unmatched_tasks": outcome.unmatched_tasks,
        });

        if args.execute {
            let executor = self.executor.as_ref().ok_or_else(|| {
                ConductorError::Mcp("No task executor configured for this server".into())
            })?;
            let summary = orchestrator.execute_assigned(executor.as_ref()).await;
            info!(
                completed = summary.completed.len(),
                failures = summary.failures.len(),
                "Executed assigned tasks"
            );
            response["execution"] = serde_json::to_value(&summary)?;
            response["report"] = serde_json::to_value(orchestrator.report())?;
        } else {
            response["report"] = serde_json::to_value(&report)?;
        }
        Ok(response)
    }
}

/// `orchestrator_status`: current status report, invariant check included.
pub struct OrchestratorStatusTool {
    definition: ToolDef,
    orchestrator: SharedOrchestrator,
}

impl OrchestratorStatusTool {
    /// Status tool over a shared orchestrator.
    pub fn new(orchestrator: SharedOrchestrator) -> Self {
        Self {
            definition: ToolDef::new(
                "orchestrator_status",
                "Agents, tasks and assignment invariant status",
                json!({"type": "object", "properties": {}}),
            ),
            orchestrator,
        }
    }
}

#[async_trait]
impl Tool for OrchestratorStatusTool {
    fn definition(&self) -> &ToolDef {
        &self.definition
    }

    async fn call(&self, _arguments: Value) -> ConductorResult<Value> {
        let report = self.orchestrator.lock().await.report();
        Ok(serde_json::to_value(report)?)
    }
}
