//! The scored ("enhanced") allocation variant.
//!
//! Each candidate agent gets
//! `0.4 * capability_match + 0.4 * efficiency_score + 0.2 * availability`
//! and the strictly highest score wins. Ties keep the earliest agent in
//! registration order, and a score of zero never wins.

use chrono::{DateTime, Utc};
use conductor_core::{ConductorError, ConductorResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CAPABILITY_WEIGHT: f64 = 0.4;
const EFFICIENCY_WEIGHT: f64 = 0.4;
const AVAILABILITY_WEIGHT: f64 = 0.2;
const SPECIALIZATION_BONUS: f64 = 1.5;
const NO_REQUIREMENTS_MATCH: f64 = 0.5;
const LOAD_IMBALANCE_LIMIT: usize = 2;
const LOW_EFFICIENCY: f64 = 0.7;

/// Default number of in-flight tasks an agent is scored against.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Status of a scored agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoredAgentStatus {
    /// Registered, holding no task.
    Idle,
    /// Holding at least one task.
    Active,
    /// Not taking work.
    Busy,
    /// Failed; not taking work.
    Error,
    /// Taken out for maintenance.
    Maintenance,
}

impl ScoredAgentStatus {
    /// Only idle and active agents take part in distribution.
    pub fn accepts_work(self) -> bool {
        matches!(self, ScoredAgentStatus::Idle | ScoredAgentStatus::Active)
    }
}

/// Priority of a scored task. Lower discriminant is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoredPriority {
    /// Distributed first.
    Critical = 1,
    /// Urgent.
    High = 2,
    /// Default.
    Medium = 3,
    /// Distributed last.
    Low = 4,
}

impl std::str::FromStr for ScoredPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(ScoredPriority::Critical),
            "high" => Ok(ScoredPriority::High),
            "medium" => Ok(ScoredPriority::Medium),
            "low" => Ok(ScoredPriority::Low),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// Lifecycle of a scored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoredTaskStatus {
    /// Queued.
    Pending,
    /// Given to an agent, not yet started.
    Assigned,
    /// Running.
    Active,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl ScoredTaskStatus {
    /// Assigned or active: counts against the agent's concurrency.
    pub fn is_in_flight(self) -> bool {
        matches!(self, ScoredTaskStatus::Assigned | ScoredTaskStatus::Active)
    }
}

/// Running performance record of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    /// Tasks finished, successful or not.
    pub tasks_completed: u64,
    /// Fraction of completed tasks that succeeded.
    pub success_rate: f64,
    /// Mean seconds from assignment to completion.
    pub avg_response_secs: f64,
    /// Efficiency in `0..=1`; used in scoring.
    pub efficiency_score: f64,
    /// Last completion time.
    pub last_active: Option<DateTime<Utc>>,
}

impl Default for AgentPerformance {
    fn default() -> Self {
        Self {
            tasks_completed: 0,
            success_rate: 1.0,
            avg_response_secs: 0.0,
            efficiency_score: 1.0,
            last_active: None,
        }
    }
}

impl AgentPerformance {
    fn record_completion(&mut self, success: bool, response_secs: f64) {
        let previous = self.tasks_completed as f64;
        self.tasks_completed += 1;
        let n = self.tasks_completed as f64;
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = (self.success_rate * previous + outcome) / n;
        self.avg_response_secs = (self.avg_response_secs * previous + response_secs) / n;
        self.last_active = Some(Utc::now());
    }
}

/// An agent of the scored variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredAgent {
    /// Unique agent id.
    pub id: String,
    /// Free-form role description.
    pub role: String,
    /// Capabilities matched against task requirements.
    pub capabilities: Vec<String>,
    /// Areas the agent specialises in.
    pub specializations: Vec<String>,
    /// Current status.
    pub status: ScoredAgentStatus,
    /// Running performance record.
    pub performance: AgentPerformance,
}

impl ScoredAgent {
    /// Idle agent with a fresh performance record.
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        capabilities: &[&str],
        specializations: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            capabilities: capabilities.iter().map(|c| (*c).to_string()).collect(),
            specializations: specializations.iter().map(|s| (*s).to_string()).collect(),
            status: ScoredAgentStatus::Idle,
            performance: AgentPerformance::default(),
        }
    }
}

/// A task of the scored variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredTask {
    /// Unique task id.
    pub id: Uuid,
    /// Task kind, e.g. `route`.
    pub kind: String,
    /// Distribution priority.
    pub priority: ScoredPriority,
    /// Lifecycle state.
    pub status: ScoredTaskStatus,
    /// Agent the task was given to.
    pub assigned_agent: Option<String>,
    /// Capabilities an agent should have; empty matches anyone.
    pub required_capabilities: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// When the task was assigned.
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the task finished.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScoredTask {
    /// Pending task with a fresh id.
    pub fn new(kind: impl Into<String>, priority: ScoredPriority, required: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            priority,
            status: ScoredTaskStatus::Pending,
            assigned_agent: None,
            required_capabilities: required,
            created_at: Utc::now(),
            assigned_at: None,
            completed_at: None,
        }
    }
}

/// Optimization opportunity flagged by [`ScoredOrchestrator::optimization_opportunities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opportunity {
    /// In-flight load differs by more than two tasks between agents.
    LoadBalancing,
    /// At least one agent's efficiency is below 0.7.
    PerformanceImprovement,
}

/// Aggregate view of the scored orchestrator at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    /// When the state was computed.
    pub timestamp: DateTime<Utc>,
    /// Registered agents.
    pub total_agents: usize,
    /// Agents in the active status.
    pub active_agents: usize,
    /// Tasks that have left the queue.
    pub total_tasks: usize,
    /// Tasks still queued.
    pub pending_tasks: usize,
    /// See [`ScoredOrchestrator::system_load`].
    pub system_load: f64,
    /// See [`ScoredOrchestrator::optimization_opportunities`].
    pub optimization_opportunities: Vec<Opportunity>,
}

/// JSON performance report of the scored orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Aggregate state.
    pub system_overview: SystemState,
    /// Every agent with its performance record.
    pub agents: Vec<ScoredAgent>,
}

/// Scored orchestrator: agents in registration order, a FIFO queue of
/// pending tasks and the record of every task that left the queue.
#[derive(Debug)]
pub struct ScoredOrchestrator {
    agents: Vec<ScoredAgent>,
    queue: Vec<ScoredTask>,
    tasks: Vec<ScoredTask>,
    max_concurrent: usize,
}

impl Default for ScoredOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl ScoredOrchestrator {
    /// `max_concurrent` is clamped to at least one.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            agents: Vec::new(),
            queue: Vec::new(),
            tasks: Vec::new(),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Orchestrator with `agents` registered in order.
    pub fn with_agents(max_concurrent: usize, agents: Vec<ScoredAgent>) -> ConductorResult<Self> {
        let mut orchestrator = Self::new(max_concurrent);
        for agent in agents {
            orchestrator.register_agent(agent)?;
        }
        Ok(orchestrator)
    }

    /// Register an agent. Duplicate ids are rejected.
    pub fn register_agent(&mut self, agent: ScoredAgent) -> ConductorResult<()> {
        if self.agent(&agent.id).is_some() {
            return Err(ConductorError::Orchestrator(format!(
                "Agent '{}' is already registered",
                agent.id
            )));
        }
        info!(agent = %agent.id, role = %agent.role, "Scored agent registered");
        self.agents.push(agent);
        Ok(())
    }

    /// Agents in registration order.
    pub fn agents(&self) -> &[ScoredAgent] {
        &self.agents
    }

    /// Agent with `id`.
    pub fn agent(&self, id: &str) -> Option<&ScoredAgent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Tasks still waiting in the queue, front first.
    pub fn queue(&self) -> &[ScoredTask] {
        &self.queue
    }

    /// Tasks that have left the queue.
    pub fn tasks(&self) -> &[ScoredTask] {
        &self.tasks
    }

    /// Task with `id`, queued or not.
    pub fn task(&self, id: Uuid) -> Option<&ScoredTask> {
        self.tasks
            .iter()
            .chain(self.queue.iter())
            .find(|t| t.id == id)
    }

    /// In-flight tasks an agent is scored against.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Append a new task to the back of the queue.
    pub fn create_task(
        &mut self,
        kind: impl Into<String>,
        priority: ScoredPriority,
        required_capabilities: Vec<String>,
    ) -> Uuid {
        let task = ScoredTask::new(kind, priority, required_capabilities);
        let id = task.id;
        debug!(task_id = %id, kind = %task.kind, "Scored task queued");
        self.queue.push(task);
        id
    }

    /// Force an agent into a status, e.g. maintenance.
    pub fn set_agent_status(&mut self, id: &str, status: ScoredAgentStatus) -> ConductorResult<()> {
        let agent = self.agent_mut(id)?;
        agent.status = status;
        Ok(())
    }

    /// Overwrite an agent's efficiency score, clamped to `[0, 1]`.
    pub fn record_efficiency(&mut self, id: &str, score: f64) -> ConductorResult<()> {
        let agent = self.agent_mut(id)?;
        agent.performance.efficiency_score = score.clamp(0.0, 1.0);
        Ok(())
    }

    /// `(capability hits + 1.5 * specialization hits) / required`, capped at 1.
    pub fn capability_match(task: &ScoredTask, agent: &ScoredAgent) -> f64 {
        let required = &task.required_capabilities;
        if required.is_empty() {
            return NO_REQUIREMENTS_MATCH;
        }
        let hits = required
            .iter()
            .filter(|r| agent.capabilities.contains(r))
            .count() as f64;
        let specialized = required
            .iter()
            .filter(|r| agent.specializations.contains(r))
            .count() as f64;
        ((hits + specialized * SPECIALIZATION_BONUS) / required.len() as f64).min(1.0)
    }

    /// In-flight tasks held by `agent_id`.
    pub fn in_flight(&self, agent_id: &str) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status.is_in_flight() && t.assigned_agent.as_deref() == Some(agent_id))
            .count()
    }

    /// Free share of the agent's concurrency, floored at 0.
    pub fn availability(&self, agent_id: &str) -> f64 {
        let max = self.max_concurrent as f64;
        ((max - self.in_flight(agent_id) as f64) / max).max(0.0)
    }

    /// Weighted score of `agent` for `task`.
    pub fn score(&self, task: &ScoredTask, agent: &ScoredAgent) -> f64 {
        CAPABILITY_WEIGHT * Self::capability_match(task, agent)
            + EFFICIENCY_WEIGHT * agent.performance.efficiency_score
            + AVAILABILITY_WEIGHT * self.availability(&agent.id)
    }

    /// Best agent for `task` among `candidates`, strictly greater than zero.
    fn best_agent(&self, task: &ScoredTask, candidates: &[usize]) -> Option<usize> {
        let mut best: Option<usize> = None;
        let mut best_score = 0.0;
        for &index in candidates {
            let score = self.score(task, &self.agents[index]);
            if score > best_score {
                best_score = score;
                best = Some(index);
            }
        }
        best
    }

    /// Id of the agent that would receive `task` right now.
    pub fn find_optimal_agent(&self, task: &ScoredTask) -> Option<&str> {
        let candidates = self.candidate_indices();
        self.best_agent(task, &candidates)
            .map(|i| self.agents[i].id.as_str())
    }

    fn candidate_indices(&self) -> Vec<usize> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.status.accepts_work())
            .map(|(i, _)| i)
            .collect()
    }

    /// Walk the queue front to back and assign what can be assigned.
    ///
    /// The candidate set is fixed at the start of the pass. Assigned tasks
    /// leave the queue; the rest keep their order.
    pub fn distribute(&mut self) -> Vec<(Uuid, String)> {
        let candidates = self.candidate_indices();
        let mut assigned = Vec::new();
        if candidates.is_empty() {
            if !self.queue.is_empty() {
                warn!(pending = self.queue.len(), "No agent accepts work");
            }
            return assigned;
        }

        let pending = std::mem::take(&mut self.queue);
        for mut task in pending {
            let Some(index) = self.best_agent(&task, &candidates) else {
                debug!(task_id = %task.id, kind = %task.kind, "No agent scored above zero");
                self.queue.push(task);
                continue;
            };

            let agent = &mut self.agents[index];
            agent.status = ScoredAgentStatus::Active;
            task.status = ScoredTaskStatus::Assigned;
            task.assigned_agent = Some(agent.id.clone());
            task.assigned_at = Some(Utc::now());

            info!(task_id = %task.id, kind = %task.kind, agent = %agent.id, "Scored task assigned");
            assigned.push((task.id, agent.id.clone()));
            self.tasks.push(task);
        }
        assigned
    }

    /// Move an assigned task to active.
    pub fn start_task(&mut self, task_id: Uuid) -> ConductorResult<()> {
        let task = self.assigned_task_mut(task_id)?;
        if task.status != ScoredTaskStatus::Assigned {
            return Err(ConductorError::Orchestrator(format!(
                "Task {task_id} is {:?}, not assigned",
                task.status
            )));
        }
        task.status = ScoredTaskStatus::Active;
        Ok(())
    }

    /// Finish an in-flight task and fold the outcome into the agent's record.
    ///
    /// The agent returns to idle once it holds no in-flight task.
    pub fn complete_scored_task(&mut self, task_id: Uuid, success: bool) -> ConductorResult<()> {
        let task = self.assigned_task_mut(task_id)?;
        if !task.status.is_in_flight() {
            return Err(ConductorError::Orchestrator(format!(
                "Task {task_id} is not in flight"
            )));
        }
        let now = Utc::now();
        task.status = if success {
            ScoredTaskStatus::Completed
        } else {
            ScoredTaskStatus::Failed
        };
        task.completed_at = Some(now);
        let response_secs = task
            .assigned_at
            .map(|at| (now - at).num_milliseconds() as f64 / 1000.0)
            .unwrap_or_default();
        let agent_id = task.assigned_agent.clone().ok_or_else(|| {
            ConductorError::Orchestrator(format!("Task {task_id} has no assigned agent"))
        })?;

        let still_busy = self.in_flight(&agent_id) > 0;
        let agent = self.agent_mut(&agent_id)?;
        agent.performance.record_completion(success, response_secs);
        if !still_busy && agent.status == ScoredAgentStatus::Active {
            agent.status = ScoredAgentStatus::Idle;
        }
        info!(task_id = %task_id, agent = %agent_id, success, "Scored task finished");
        Ok(())
    }

    /// In-flight tasks over total capacity; 0 with no agents.
    pub fn system_load(&self) -> f64 {
        let capacity = self.agents.len() * self.max_concurrent;
        if capacity == 0 {
            return 0.0;
        }
        let in_flight = self
            .tasks
            .iter()
            .filter(|t| t.status.is_in_flight())
            .count();
        in_flight as f64 / capacity as f64
    }

    /// Opportunities flagged from current load and efficiency.
    pub fn optimization_opportunities(&self) -> Vec<Opportunity> {
        let mut opportunities = Vec::new();

        let loads: Vec<usize> = self.agents.iter().map(|a| self.in_flight(&a.id)).collect();
        if let (Some(max), Some(min)) = (loads.iter().max(), loads.iter().min()) {
            if max - min > LOAD_IMBALANCE_LIMIT {
                opportunities.push(Opportunity::LoadBalancing);
            }
        }

        if self
            .agents
            .iter()
            .any(|a| a.performance.efficiency_score < LOW_EFFICIENCY)
        {
            opportunities.push(Opportunity::PerformanceImprovement);
        }

        opportunities
    }

    /// Aggregate state as of now.
    pub fn system_state(&self) -> SystemState {
        SystemState {
            timestamp: Utc::now(),
            total_agents: self.agents.len(),
            active_agents: self
                .agents
                .iter()
                .filter(|a| a.status == ScoredAgentStatus::Active)
                .count(),
            total_tasks: self.tasks.len(),
            pending_tasks: self.queue.len(),
            system_load: self.system_load(),
            optimization_opportunities: self.optimization_opportunities(),
        }
    }

    /// Aggregate state plus every agent.
    pub fn performance_report(&self) -> PerformanceReport {
        PerformanceReport {
            system_overview: self.system_state(),
            agents: self.agents.clone(),
        }
    }

    /// Every distributed task must point at a registered agent.
    pub fn check_consistency(&self) -> ConductorResult<()> {
        for task in &self.tasks {
            match task.assigned_agent.as_deref() {
                Some(id) if self.agent(id).is_some() => {}
                Some(id) => {
                    return Err(ConductorError::Orchestrator(format!(
                        "Task {} references unknown agent '{id}'",
                        task.id
                    )))
                }
                None => {
                    return Err(ConductorError::Orchestrator(format!(
                        "Task {} left the queue without an agent",
                        task.id
                    )))
                }
            }
        }
        Ok(())
    }

    fn agent_mut(&mut self, id: &str) -> ConductorResult<&mut ScoredAgent> {
        self.agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ConductorError::Orchestrator(format!("Unknown agent '{id}'")))
    }

    fn assigned_task_mut(&mut self, id: Uuid) -> ConductorResult<&mut ScoredTask> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ConductorError::Orchestrator(format!("Unknown or unassigned task {id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn caps(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_capability_match_no_requirements() {
        let agent = ScoredAgent::new("A", "role", &["x"], &[]);
        let task = ScoredTask::new("t", ScoredPriority::Low, vec![]);
        assert_eq!(ScoredOrchestrator::capability_match(&task, &agent), 0.5);
    }

    #[test]
    fn test_capability_match_specialization_and_cap() {
        let agent = ScoredAgent::new("A", "role", &["x"], &["y"]);
        let half = ScoredTask::new("t", ScoredPriority::Low, caps(&["x", "z"]));
        assert!((ScoredOrchestrator::capability_match(&half, &agent) - 0.5).abs() < 1e-9);

        let special = ScoredTask::new("t", ScoredPriority::Low, caps(&["y", "z"]));
        assert!((ScoredOrchestrator::capability_match(&special, &agent) - 0.75).abs() < 1e-9);

        let both = ScoredTask::new("t", ScoredPriority::Low, caps(&["x", "y"]));
        assert_eq!(ScoredOrchestrator::capability_match(&both, &agent), 1.0);
    }

    #[test]
    fn test_availability_drops_with_in_flight() {
        let mut orch =
            ScoredOrchestrator::with_agents(2, vec![ScoredAgent::new("A", "r", &["x"], &[])])
                .unwrap();
        assert_eq!(orch.availability("A"), 1.0);
        orch.create_task("t1", ScoredPriority::High, caps(&["x"]));
        orch.create_task("t2", ScoredPriority::High, caps(&["x"]));
        orch.create_task("t3", ScoredPriority::High, caps(&["x"]));
        assert_eq!(orch.distribute().len(), 3);
        assert_eq!(orch.in_flight("A"), 3);
        assert_eq!(orch.availability("A"), 0.0);
    }

    #[test]
    fn test_performance_record_running_average() {
        let mut perf = AgentPerformance::default();
        perf.record_completion(true, 2.0);
        perf.record_completion(false, 4.0);
        assert_eq!(perf.tasks_completed, 2);
        assert!((perf.success_rate - 0.5).abs() < 1e-9);
        assert!((perf.avg_response_secs - 3.0).abs() < 1e-9);
        assert!(perf.last_active.is_some());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("HIGH".parse::<ScoredPriority>().unwrap(), ScoredPriority::High);
        assert!("urgent".parse::<ScoredPriority>().is_err());
        assert!(ScoredPriority::Critical < ScoredPriority::Low);
    }

    #[test]
    fn test_start_requires_assigned() {
        let mut orch =
            ScoredOrchestrator::with_agents(3, vec![ScoredAgent::new("A", "r", &[], &[])]).unwrap();
        let id = orch.create_task("t", ScoredPriority::Medium, vec![]);
        assert!(orch.start_task(id).is_err());
        orch.distribute();
        orch.start_task(id).unwrap();
        assert_eq!(orch.task(id).unwrap().status, ScoredTaskStatus::Active);
        assert!(orch.start_task(id).is_err());
    }

    #[test]
    fn test_consistency_holds_after_distribution() {
        let mut orch = ScoredOrchestrator::with_agents(
            3,
            vec![
                ScoredAgent::new("A", "r", &["x"], &[]),
                ScoredAgent::new("B", "r", &["y"], &[]),
            ],
        )
        .unwrap();
        orch.create_task("t", ScoredPriority::Medium, caps(&["y"]));
        orch.distribute();
        assert!(orch.check_consistency().is_ok());
    }
}
