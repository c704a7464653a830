use crate::registry::AgentRegistry;
use crate::task_queue::TaskQueue;
use crate::types::{AgentStatus, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One agent row in a [`StatusReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLine {
    /// Agent name.
    pub name: String,
    /// Idle or working.
    pub status: AgentStatus,
    /// Name of the task the agent is working on.
    pub current_task: Option<String>,
    /// Capabilities the agent offers.
    pub capabilities: Vec<String>,
}

/// One task row in a [`StatusReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLine {
    /// Task name.
    pub name: String,
    /// Tier it was queued in.
    pub priority: TaskPriority,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Agent holding or having held it.
    pub assigned_agent: Option<String>,
}

/// Read-only snapshot of the registry and queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Agents in registration order.
    pub agents: Vec<AgentLine>,
    /// Tasks in queue order.
    pub tasks: Vec<TaskLine>,
    /// Pending task count.
    pub pending: usize,
    /// Assigned task count.
    pub assigned: usize,
    /// Completed task count.
    pub completed: usize,
    /// Empty when the assignment invariant holds.
    pub invariant_violations: Vec<String>,
}

impl StatusReport {
    pub(crate) fn build(
        registry: &AgentRegistry,
        queue: &TaskQueue,
        invariant_violations: Vec<String>,
    ) -> Self {
        let agents = registry
            .iter()
            .map(|agent| AgentLine {
                name: agent.name.clone(),
                status: agent.status,
                current_task: agent
                    .current_task
                    .and_then(|id| queue.get(id))
                    .map(|t| t.name.clone()),
                capabilities: agent.capabilities.clone(),
            })
            .collect();

        let tasks = queue
            .all_tasks()
            .iter()
            .map(|task| TaskLine {
                name: task.name.clone(),
                priority: task.priority,
                status: task.status,
                assigned_agent: task.assigned_agent.clone(),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            agents,
            tasks,
            pending: queue.count(TaskStatus::Pending),
            assigned: queue.count(TaskStatus::Assigned),
            completed: queue.count(TaskStatus::Completed),
            invariant_violations,
        }
    }

    /// Agents currently working.
    pub fn working_agents(&self) -> usize {
        self.agents
            .iter()
            .filter(|a| a.status == AgentStatus::Working)
            .count()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Agent Status Report ===")?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f)?;

        writeln!(f, "Agents ({}):", self.agents.len())?;
        for agent in &self.agents {
            match &agent.current_task {
                Some(task) => writeln!(f, "  {}: {} ({})", agent.name, agent.status, task)?,
                None => writeln!(f, "  {}: {}", agent.name, agent.status)?,
            }
        }
        writeln!(f)?;

        writeln!(
            f,
            "Tasks ({} total, {} pending, {} assigned, {} completed):",
            self.tasks.len(),
            self.pending,
            self.assigned,
            self.completed
        )?;
        for task in &self.tasks {
            let agent = task.assigned_agent.as_deref().unwrap_or("-");
            writeln!(
                f,
                "  [{}] {} -> {} ({})",
                task.priority, task.name, agent, task.status
            )?;
        }

        if !self.invariant_violations.is_empty() {
            writeln!(f)?;
            writeln!(f, "Invariant violations:")?;
            for violation in &self.invariant_violations {
                writeln!(f, "  ! {violation}")?;
            }
        }
        Ok(())
    }
}
