use crate::config::OrchestrationConfig;
use crate::matcher::{match_task, MatchFailure};
use crate::registry::AgentRegistry;
use crate::report::StatusReport;
use crate::task_queue::TaskQueue;
use crate::types::{Agent, AgentStatus, Task, TaskPriority, TaskStatus};
use async_trait::async_trait;
use conductor_core::{Artifact, ConductorError, ConductorResult};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Executes the work behind an assigned task.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Perform `task` on behalf of `agent`, returning the files produced.
    async fn execute(&self, agent: &str, task: &Task) -> ConductorResult<Vec<Artifact>>;
}

/// A single task → agent pairing made by an assignment pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Assigned task.
    pub task_id: Uuid,
    /// Its name.
    pub task_name: String,
    /// Agent that took it.
    pub agent: String,
}

/// Result of one assignment pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentOutcome {
    /// Pairings made, in queue order.
    pub assigned: Vec<Assignment>,
    /// Names of tasks missing from the capability map.
    pub unknown_tasks: Vec<String>,
    /// Names of tasks whose capability no idle agent currently provides.
    pub unmatched_tasks: Vec<String>,
}

/// Result of running the executor over every working agent.
#[derive(Debug, Default, Serialize)]
pub struct ExecutionSummary {
    /// Tasks completed, failures included.
    pub completed: Vec<Uuid>,
    /// Files written by successful executions.
    pub artifacts: Vec<Artifact>,
    /// Tasks whose executor failed; they are still completed.
    pub failures: Vec<(Uuid, String)>,
}

/// The simple, single-threaded orchestrator: registry + ordered queue +
/// one-shot capability assignment.
pub struct Orchestrator {
    config: OrchestrationConfig,
    registry: AgentRegistry,
    queue: TaskQueue,
}

impl Orchestrator {
    /// Create an orchestrator with the roster from `config`.
    pub fn new(config: OrchestrationConfig) -> ConductorResult<Self> {
        config.validate()?;
        let registry = AgentRegistry::from_config(&config.agents)?;
        info!(agents = registry.len(), "Orchestrator: registry loaded");
        Ok(Self {
            config,
            registry,
            queue: TaskQueue::new(),
        })
    }

    /// Configuration the orchestrator was built from.
    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Agent registry.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Task queue.
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Agent registered as `name`.
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.registry.get(name)
    }

    /// Task with `id`.
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.queue.get(id)
    }

    /// Queue an externally supplied task.
    pub fn add_task(&mut self, name: impl Into<String>, priority: TaskPriority) -> Uuid {
        let task = Task::new(name, priority);
        debug!(task = %task.name, priority = %priority, "Task queued");
        self.queue.add(task)
    }

    /// Queue every task listed for `tier` in the configuration.
    ///
    /// A task already queued for the same tier and not yet completed is not
    /// queued again.
    pub fn add_priority_tier(&mut self, tier: TaskPriority) -> Vec<Uuid> {
        let names = self.config.task_priorities.tier(tier).to_vec();
        let mut added = Vec::with_capacity(names.len());
        for name in names {
            if self.queue.contains_open(&name, tier) {
                debug!(task = %name, tier = %tier, "Task already queued");
                continue;
            }
            added.push(self.add_task(name, tier));
        }
        added
    }

    /// Queue every tier, most urgent first.
    pub fn add_all_priority_tasks(&mut self) -> Vec<Uuid> {
        TaskPriority::ALL
            .into_iter()
            .flat_map(|tier| self.add_priority_tier(tier))
            .collect()
    }

    /// One forward pass over the pending tasks, in queue order.
    ///
    /// Each successful match moves the task to assigned and the agent to
    /// working together. Misses leave the task pending.
    pub fn assign_pending(&mut self) -> AssignmentOutcome {
        let mut outcome = AssignmentOutcome::default();

        for task_id in self.queue.pending_ids() {
            let Some(task) = self.queue.get(task_id) else {
                continue;
            };
            let task_name = task.name.clone();

            let agent_name = match match_task(&task_name, &self.config.capability_map, &self.registry)
            {
                Ok(agent) => agent.name.clone(),
                Err(MatchFailure::UnknownTask) => {
                    warn!(task = %task_name, "No capability mapping for task, leaving pending");
                    outcome.unknown_tasks.push(task_name);
                    continue;
                }
                Err(MatchFailure::NoIdleAgent { capability }) => {
                    warn!(
                        task = %task_name,
                        capability = %capability,
                        "No available agent for task"
                    );
                    outcome.unmatched_tasks.push(task_name);
                    continue;
                }
            };

            if let Some(agent) = self.registry.get_mut(&agent_name) {
                agent.assign_task(task_id);
                self.queue.mark_assigned(task_id, &agent_name);
                info!(task = %task_name, agent = %agent_name, "Task assigned");
                outcome.assigned.push(Assignment {
                    task_id,
                    task_name,
                    agent: agent_name,
                });
            }
        }

        outcome
    }

    /// Queue the immediate tier, run one assignment pass and report.
    pub fn orchestrate(&mut self) -> (AssignmentOutcome, StatusReport) {
        info!("Starting orchestration");
        let queued = self.add_priority_tier(TaskPriority::Immediate);
        info!(queued = queued.len(), "Immediate tasks queued");

        let outcome = self.assign_pending();
        info!(
            assigned = outcome.assigned.len(),
            unknown = outcome.unknown_tasks.len(),
            unmatched = outcome.unmatched_tasks.len(),
            "Assignment pass finished"
        );

        (outcome, self.report())
    }

    /// Release `agent` from its current task and mark that task completed.
    ///
    /// No-op returning `None` when the agent is unknown or idle.
    pub fn complete_agent_task(&mut self, agent: &str) -> Option<Uuid> {
        let task_id = self.registry.get_mut(agent)?.complete_task()?;
        self.queue.mark_completed(task_id);
        info!(agent = %agent, task_id = %task_id, "Task completed");
        Some(task_id)
    }

    /// Run `executor` for every working agent, then complete each task.
    ///
    /// Executor errors are logged and recorded; the task is completed anyway.
    pub async fn execute_assigned(&mut self, executor: &dyn TaskExecutor) -> ExecutionSummary {
        let work: Vec<(String, Task)> = self
            .registry
            .iter()
            .filter_map(|agent| {
                let task = self.queue.get(agent.current_task?)?;
                Some((agent.name.clone(), task.clone()))
            })
            .collect();

        let mut summary = ExecutionSummary::default();
        for (agent, task) in work {
            match executor.execute(&agent, &task).await {
                Ok(artifacts) => {
                    info!(
                        agent = %agent,
                        task = %task.name,
                        artifacts = artifacts.len(),
                        "Task executed"
                    );
                    summary.artifacts.extend(artifacts);
                }
                Err(e) => {
                    error!(agent = %agent, task = %task.name, error = %e, "Task execution failed");
                    summary.failures.push((task.id, e.to_string()));
                }
            }
            if let Some(id) = self.complete_agent_task(&agent) {
                summary.completed.push(id);
            }
        }
        summary
    }

    /// Every breach of the assignment invariant, as readable messages.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for task in self.queue.all_tasks() {
            if task.status != TaskStatus::Assigned {
                continue;
            }
            let Some(agent_name) = &task.assigned_agent else {
                violations.push(format!("task '{}' is assigned without an agent", task.name));
                continue;
            };
            match self.registry.get(agent_name) {
                None => violations.push(format!(
                    "task '{}' is assigned to unknown agent '{agent_name}'",
                    task.name
                )),
                Some(agent) if agent.status != AgentStatus::Working => violations.push(format!(
                    "task '{}' is assigned to idle agent '{agent_name}'",
                    task.name
                )),
                Some(agent) if agent.current_task != Some(task.id) => violations.push(format!(
                    "agent '{agent_name}' does not hold assigned task '{}'",
                    task.name
                )),
                Some(_) => {}
            }
        }

        for agent in self.registry.iter() {
            match (agent.status, agent.current_task) {
                (AgentStatus::Idle, Some(_)) => {
                    violations.push(format!("idle agent '{}' holds a task", agent.name));
                }
                (AgentStatus::Working, None) => {
                    violations.push(format!("working agent '{}' has no task", agent.name));
                }
                (AgentStatus::Working, Some(id)) => {
                    let held = self.queue.get(id).is_some_and(|t| {
                        t.status == TaskStatus::Assigned
                            && t.assigned_agent.as_deref() == Some(agent.name.as_str())
                    });
                    if !held {
                        violations.push(format!(
                            "agent '{}' works on a task not assigned to it",
                            agent.name
                        ));
                    }
                }
                (AgentStatus::Idle, None) => {}
            }
        }

        violations
    }

    /// Verify that a task is assigned iff its agent is working on it.
    pub fn check_invariants(&self) -> ConductorResult<()> {
        match self.invariant_violations().into_iter().next() {
            Some(first) => Err(ConductorError::Orchestrator(first)),
            None => Ok(()),
        }
    }

    /// Snapshot of the registry and queue.
    pub fn report(&self) -> StatusReport {
        StatusReport::build(&self.registry, &self.queue, self.invariant_violations())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;

    fn default_orchestrator() -> Orchestrator {
        Orchestrator::new(OrchestrationConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_duplicate_agents() {
        let mut config = OrchestrationConfig::default();
        config
            .agents
            .push(AgentConfig::new("DocumentationAgent", &["x"]));
        assert!(Orchestrator::new(config).is_err());
    }

    #[test]
    fn test_add_priority_tier_skips_open_duplicates() {
        let mut orch = default_orchestrator();
        assert_eq!(orch.add_priority_tier(TaskPriority::Immediate).len(), 2);
        assert!(orch.add_priority_tier(TaskPriority::Immediate).is_empty());
        assert_eq!(orch.add_all_priority_tasks().len(), 5);
        assert_eq!(orch.queue().total_count(), 7);
    }

    #[test]
    fn test_assign_pending_outcome_categories() {
        let mut orch = default_orchestrator();
        orch.add_task("create_documentation_framework", TaskPriority::Immediate);
        orch.add_task("expand_documentation", TaskPriority::MediumTerm);

        let outcome = orch.assign_pending();
        assert_eq!(outcome.assigned.len(), 1);
        assert_eq!(outcome.assigned[0].agent, "DocumentationAgent");
        assert_eq!(outcome.unknown_tasks, vec!["expand_documentation".to_string()]);
        assert!(outcome.unmatched_tasks.is_empty());
        assert!(orch.check_invariants().is_ok());
    }

    #[test]
    fn test_complete_agent_task_marks_task_completed() {
        let mut orch = default_orchestrator();
        let id = orch.add_task("implement_basic_testing", TaskPriority::ShortTerm);
        orch.assign_pending();

        assert_eq!(orch.complete_agent_task("TestingAgent"), Some(id));
        assert_eq!(orch.task(id).unwrap().status, TaskStatus::Completed);
        assert!(orch.agent("TestingAgent").unwrap().is_idle());
        assert!(orch.check_invariants().is_ok());

        assert!(orch.complete_agent_task("TestingAgent").is_none());
        assert!(orch.complete_agent_task("NobodyAgent").is_none());
    }

    #[test]
    fn test_report_text() {
        let mut orch = default_orchestrator();
        let (_, report) = orch.orchestrate();
        let text = report.to_string();
        assert!(text.contains("=== Agent Status Report ==="));
        assert!(text.contains("DocumentationAgent: working (create_documentation_framework)"));
        assert!(text.contains("TestingAgent: idle"));
        assert!(report.invariant_violations.is_empty());
    }
}
