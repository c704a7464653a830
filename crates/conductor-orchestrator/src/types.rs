use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Priority tier of a task in the simple orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Queued first.
    Immediate,
    /// Queued after immediate.
    ShortTerm,
    /// Queued last.
    MediumTerm,
}

impl TaskPriority {
    /// All tiers, most urgent first.
    pub const ALL: [TaskPriority; 3] = [
        TaskPriority::Immediate,
        TaskPriority::ShortTerm,
        TaskPriority::MediumTerm,
    ];
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Immediate => write!(f, "immediate"),
            TaskPriority::ShortTerm => write!(f, "short_term"),
            TaskPriority::MediumTerm => write!(f, "medium_term"),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(TaskPriority::Immediate),
            "short_term" | "short-term" => Ok(TaskPriority::ShortTerm),
            "medium_term" | "medium-term" => Ok(TaskPriority::MediumTerm),
            other => Err(format!("unknown priority tier '{other}'")),
        }
    }
}

/// Status of a task in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for an agent.
    Pending,
    /// Held by an agent.
    Assigned,
    /// Done.
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Assigned => write!(f, "assigned"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Status of an agent in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Free to take a task.
    Idle,
    /// Holding a task.
    Working,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Working => write!(f, "working"),
        }
    }
}

/// A unit of work, matched to an agent through the capability map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task id.
    pub id: Uuid,
    /// Doubles as the lookup key into the capability map.
    pub name: String,
    /// Tier the task was queued in.
    pub priority: TaskPriority,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Set at assignment time, never before.
    pub assigned_agent: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Pending task with a fresh id.
    pub fn new(name: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            priority,
            status: TaskStatus::Pending,
            assigned_agent: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Whether the task still waits for an agent.
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// A named bundle of capabilities with a single current-task slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent name.
    pub name: String,
    /// Capabilities the agent offers.
    pub capabilities: Vec<String>,
    /// Idle or working.
    pub status: AgentStatus,
    /// Owned by the agent while it is working.
    pub current_task: Option<Uuid>,
    /// Last status change.
    pub last_updated: DateTime<Utc>,
}

impl Agent {
    /// Idle agent.
    pub fn new(name: impl Into<String>, capabilities: Vec<String>) -> Self {
        Self {
            name: name.into(),
            capabilities,
            status: AgentStatus::Idle,
            current_task: None,
            last_updated: Utc::now(),
        }
    }

    /// Whether the agent offers `capability`.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether the agent is free.
    pub fn is_idle(&self) -> bool {
        self.status == AgentStatus::Idle
    }

    /// Take ownership of a task and start working on it.
    pub fn assign_task(&mut self, task_id: Uuid) {
        self.current_task = Some(task_id);
        self.status = AgentStatus::Working;
        self.last_updated = Utc::now();
    }

    /// Release the current task and return to idle.
    ///
    /// No-op when the agent has no current task. Only the agent side is
    /// touched; the task itself is left as-is.
    pub fn complete_task(&mut self) -> Option<Uuid> {
        let finished = self.current_task.take()?;
        self.status = AgentStatus::Idle;
        self.last_updated = Utc::now();
        Some(finished)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let task = Task::new("create_documentation_framework", TaskPriority::Immediate);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.assigned_agent.is_none());
        assert!(task.is_pending());
    }

    #[test]
    fn test_agent_assign_and_complete() {
        let mut agent = Agent::new("DocumentationAgent", vec!["create_documentation".into()]);
        let task_id = Uuid::new_v4();

        agent.assign_task(task_id);
        assert_eq!(agent.status, AgentStatus::Working);
        assert_eq!(agent.current_task, Some(task_id));

        assert_eq!(agent.complete_task(), Some(task_id));
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.current_task.is_none());
    }

    #[test]
    fn test_complete_task_when_idle_is_noop() {
        let mut agent = Agent::new("TestingAgent", vec!["create_tests".into()]);
        let stamp = agent.last_updated;

        assert!(agent.complete_task().is_none());
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.current_task.is_none());
        assert_eq!(agent.last_updated, stamp);
    }

    #[test]
    fn test_has_capability() {
        let agent = Agent::new(
            "MonitoringAgent",
            vec!["monitor_performance".into(), "log_metrics".into()],
        );
        assert!(agent.has_capability("log_metrics"));
        assert!(!agent.has_capability("review_code"));
    }

    #[test]
    fn test_priority_parse_and_display() {
        for tier in TaskPriority::ALL {
            assert_eq!(tier.to_string().parse::<TaskPriority>().unwrap(), tier);
        }
        assert_eq!(
            "short-term".parse::<TaskPriority>().unwrap(),
            TaskPriority::ShortTerm
        );
        assert!("someday".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TaskStatus::Assigned).unwrap();
        assert_eq!(json, "\"assigned\"");
        let json = serde_json::to_string(&TaskPriority::MediumTerm).unwrap();
        assert_eq!(json, "\"medium_term\"");
        let parsed: AgentStatus = serde_json::from_str("\"working\"").unwrap();
        assert_eq!(parsed, AgentStatus::Working);
    }
}
