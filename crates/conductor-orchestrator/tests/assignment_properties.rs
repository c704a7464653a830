#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Behavioural properties of the simple and scored orchestrators.

use async_trait::async_trait;
use conductor_core::{Artifact, ArtifactKind, ConductorError, ConductorResult};
use conductor_orchestrator::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

fn single_agent_config() -> OrchestrationConfig {
    OrchestrationConfig {
        agents: vec![AgentConfig::new("Writer", &["write"])],
        task_priorities: TaskPriorities::default(),
        capability_map: BTreeMap::from([
            ("draft_intro".to_string(), "write".to_string()),
            ("draft_outro".to_string(), "write".to_string()),
        ]),
    }
}

// ---------------------------------------------------------------------------
// 1. Unknown tasks stay pending forever
// ---------------------------------------------------------------------------

#[test]
fn unknown_tasks_stay_pending_across_passes() {
    let mut orch = Orchestrator::new(OrchestrationConfig::default()).unwrap();
    let id = orch.add_task("write_poetry", TaskPriority::Immediate);

    for _ in 0..5 {
        let outcome = orch.assign_pending();
        assert!(outcome.assigned.is_empty());
        assert_eq!(outcome.unknown_tasks, vec!["write_poetry".to_string()]);
    }

    let task = orch.task(id).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.assigned_agent.is_none());
}

// ---------------------------------------------------------------------------
// 2. Each assignment moves one agent and one task together
// ---------------------------------------------------------------------------

#[test]
fn assignment_moves_agent_and_task_together() {
    let mut orch = Orchestrator::new(OrchestrationConfig::default()).unwrap();
    orch.add_all_priority_tasks();

    let idle_before = orch.registry().count(AgentStatus::Idle);
    let pending_before = orch.queue().pending_count();

    let outcome = orch.assign_pending();
    let n = outcome.assigned.len();

    assert_eq!(orch.registry().count(AgentStatus::Idle), idle_before - n);
    assert_eq!(orch.registry().count(AgentStatus::Working), n);
    assert_eq!(orch.queue().pending_count(), pending_before - n);
    assert_eq!(orch.queue().count(TaskStatus::Assigned), n);

    for assignment in &outcome.assigned {
        let agent = orch.agent(&assignment.agent).unwrap();
        assert_eq!(agent.current_task, Some(assignment.task_id));
        let task = orch.task(assignment.task_id).unwrap();
        assert_eq!(task.assigned_agent.as_deref(), Some(assignment.agent.as_str()));
    }
    orch.check_invariants().unwrap();
}

// ---------------------------------------------------------------------------
// 3. Default configuration: both immediate tasks assigned in one pass
// ---------------------------------------------------------------------------

#[test]
fn default_orchestrate_assigns_both_immediate_tasks() {
    let mut orch = Orchestrator::new(OrchestrationConfig::default()).unwrap();
    let (outcome, report) = orch.orchestrate();

    assert_eq!(outcome.assigned.len(), 2);
    assert_eq!(outcome.assigned[0].agent, "DocumentationAgent");
    assert_eq!(outcome.assigned[1].agent, "CodeReviewAgent");
    assert_eq!(orch.agent("DocumentationAgent").unwrap().status, AgentStatus::Working);
    assert_eq!(orch.agent("CodeReviewAgent").unwrap().status, AgentStatus::Working);
    assert_eq!(orch.agent("TestingAgent").unwrap().status, AgentStatus::Idle);

    assert_eq!(report.assigned, 2);
    assert_eq!(report.pending, 0);
    assert_eq!(report.working_agents(), 2);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["tasks"][0]["status"], "assigned");
    assert_eq!(json["agents"][0]["status"], "working");
}

// ---------------------------------------------------------------------------
// 4. Two tasks competing for one agent
// ---------------------------------------------------------------------------

#[test]
fn two_tasks_one_agent_only_first_assigned() {
    let mut orch = Orchestrator::new(single_agent_config()).unwrap();
    let first = orch.add_task("draft_intro", TaskPriority::Immediate);
    let second = orch.add_task("draft_outro", TaskPriority::Immediate);

    let outcome = orch.assign_pending();
    assert_eq!(outcome.assigned.len(), 1);
    assert_eq!(outcome.unmatched_tasks, vec!["draft_outro".to_string()]);
    assert_eq!(orch.task(first).unwrap().status, TaskStatus::Assigned);
    assert_eq!(orch.task(second).unwrap().status, TaskStatus::Pending);

    // Once the agent frees up the next pass picks up the leftover.
    orch.complete_agent_task("Writer");
    let outcome = orch.assign_pending();
    assert_eq!(outcome.assigned.len(), 1);
    assert_eq!(outcome.assigned[0].task_id, second);
}

// ---------------------------------------------------------------------------
// 5. Completing an idle agent is a no-op
// ---------------------------------------------------------------------------

#[test]
fn complete_on_idle_agent_is_noop() {
    let mut orch = Orchestrator::new(OrchestrationConfig::default()).unwrap();
    assert!(orch.complete_agent_task("MonitoringAgent").is_none());
    let agent = orch.agent("MonitoringAgent").unwrap();
    assert!(agent.is_idle());
    assert!(agent.current_task.is_none());
    orch.check_invariants().unwrap();
}

// ---------------------------------------------------------------------------
// 6. Executor failures are swallowed and tasks still complete
// ---------------------------------------------------------------------------

struct FlakyExecutor {
    calls: AtomicUsize,
}

#[async_trait]
impl TaskExecutor for FlakyExecutor {
    async fn execute(&self, agent: &str, task: &Task) -> ConductorResult<Vec<Artifact>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if agent == "CodeReviewAgent" {
            return Err(ConductorError::Worker("disk full".to_string()));
        }
        Ok(vec![Artifact::new(
            ArtifactKind::Documentation,
            format!("docs/{}.md", task.name),
            1,
        )])
    }
}

#[tokio::test]
async fn execute_assigned_completes_even_on_failure() {
    let mut orch = Orchestrator::new(OrchestrationConfig::default()).unwrap();
    orch.orchestrate();

    let executor = FlakyExecutor {
        calls: AtomicUsize::new(0),
    };
    let summary = orch.execute_assigned(&executor).await;

    assert_eq!(executor.calls.load(Ordering::SeqCst), 2);
    assert_eq!(summary.completed.len(), 2);
    assert_eq!(summary.artifacts.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(orch.queue().count(TaskStatus::Completed), 2);
    assert_eq!(orch.registry().count(AgentStatus::Idle), 4);
    orch.check_invariants().unwrap();
}

// ---------------------------------------------------------------------------
// 7. Scored selection: strict maximum, insertion-order ties, zero never wins
// ---------------------------------------------------------------------------

#[test]
fn scored_selection_picks_strict_maximum() {
    let mut orch = ScoredOrchestrator::with_agents(
        3,
        vec![
            ScoredAgent::new("Generalist", "r", &["parse"], &[]),
            ScoredAgent::new("Specialist", "r", &["parse"], &["render"]),
        ],
    )
    .unwrap();
    orch.create_task("report", ScoredPriority::High, vec!["parse".into(), "render".into()]);

    let assigned = orch.distribute();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].1, "Specialist");
}

#[test]
fn scored_ties_go_to_first_registered() {
    let mut orch = ScoredOrchestrator::with_agents(
        3,
        vec![
            ScoredAgent::new("First", "r", &["x"], &[]),
            ScoredAgent::new("Second", "r", &["x"], &[]),
        ],
    )
    .unwrap();
    let task = ScoredTask::new("t", ScoredPriority::Medium, vec!["x".into()]);
    assert_eq!(orch.find_optimal_agent(&task), Some("First"));

    orch.create_task("t", ScoredPriority::Medium, vec!["x".into()]);
    assert_eq!(orch.distribute()[0].1, "First");
}

#[test]
fn scored_zero_score_never_selected() {
    let mut orch =
        ScoredOrchestrator::with_agents(1, vec![ScoredAgent::new("Tired", "r", &["y"], &[])])
            .unwrap();
    orch.record_efficiency("Tired", 0.0).unwrap();

    // Occupy the single slot so availability drops to zero.
    orch.create_task("warmup", ScoredPriority::Low, vec!["y".into()]);
    assert_eq!(orch.distribute().len(), 1);

    let id = orch.create_task("unrelated", ScoredPriority::Critical, vec!["z".into()]);
    assert!(orch.distribute().is_empty());
    assert_eq!(orch.queue().len(), 1);
    assert_eq!(orch.queue()[0].id, id);
}

#[test]
fn scored_skips_agents_in_maintenance() {
    let mut orch = ScoredOrchestrator::with_agents(3, default_scored_profiles()).unwrap();
    for agent in default_scored_profiles() {
        orch.set_agent_status(&agent.id, ScoredAgentStatus::Maintenance)
            .unwrap();
    }
    orch.create_task("any", ScoredPriority::High, vec![]);
    assert!(orch.distribute().is_empty());
    assert_eq!(orch.queue().len(), 1);
}

// ---------------------------------------------------------------------------
// 8. Scored completion, load and opportunities
// ---------------------------------------------------------------------------

#[test]
fn scored_completion_updates_performance_and_idles_agent() {
    let mut orch = ScoredOrchestrator::with_agents(3, default_scored_profiles()).unwrap();
    let id = orch.create_task(
        "forecast",
        ScoredPriority::High,
        vec!["market_analysis".into()],
    );
    let assigned = orch.distribute();
    assert_eq!(assigned[0].1, "ANALYTICS_INTELLIGENCE");
    assert!(orch.system_load() > 0.0);

    orch.start_task(id).unwrap();
    orch.complete_scored_task(id, false).unwrap();

    let agent = orch.agent("ANALYTICS_INTELLIGENCE").unwrap();
    assert_eq!(agent.status, ScoredAgentStatus::Idle);
    assert_eq!(agent.performance.tasks_completed, 1);
    assert_eq!(agent.performance.success_rate, 0.0);
    assert_eq!(orch.task(id).unwrap().status, ScoredTaskStatus::Failed);
    assert_eq!(orch.system_load(), 0.0);

    assert!(orch.complete_scored_task(id, true).is_err());
}

#[test]
fn scored_opportunities_detected() {
    let mut orch = ScoredOrchestrator::with_agents(
        5,
        vec![
            ScoredAgent::new("Busy", "r", &["x"], &["x"]),
            ScoredAgent::new("Lazy", "r", &[], &[]),
        ],
    )
    .unwrap();
    assert!(orch.optimization_opportunities().is_empty());

    for _ in 0..3 {
        orch.create_task("t", ScoredPriority::Medium, vec!["x".into()]);
    }
    orch.distribute();
    assert_eq!(orch.in_flight("Busy"), 3);
    assert_eq!(
        orch.optimization_opportunities(),
        vec![Opportunity::LoadBalancing]
    );

    orch.record_efficiency("Lazy", 0.5).unwrap();
    let report = orch.performance_report();
    assert!(report
        .system_overview
        .optimization_opportunities
        .contains(&Opportunity::PerformanceImprovement));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["system_overview"]["total_agents"], 2);
}

// ---------------------------------------------------------------------------
// 9. Coordinator backs off on failing ticks and keeps going
// ---------------------------------------------------------------------------

struct FailingHook;

#[async_trait]
impl TickHook for FailingHook {
    async fn run_task(&self, task: &ScoredTask) -> ConductorResult<bool> {
        Err(ConductorError::Worker(format!("boom on {}", task.kind)))
    }
}

#[tokio::test]
async fn coordinator_survives_failing_ticks() {
    let settings = CoordinatorSettings {
        tick_interval_ms: 1,
        error_backoff_ms: 1,
        max_ticks: Some(4),
    };
    let mut orch = ScoredOrchestrator::with_agents(3, default_scored_profiles()).unwrap();
    let id = orch.create_task("route", ScoredPriority::High, vec!["task_distribution".into()]);
    let coordinator = Coordinator::new(orch, settings).with_hook(Arc::new(FailingHook));
    let state = coordinator.state();
    let (_tx, rx) = watch::channel(false);

    let stats = coordinator.start(rx).await.unwrap();
    assert_eq!(stats.ticks, 4);
    // Only the tick that ran the task fails; the loop keeps going.
    assert_eq!(stats.failed_ticks, 1);

    let snapshot = state.read().await;
    assert_eq!(snapshot.task(id).unwrap().status, ScoredTaskStatus::Failed);
    assert!(snapshot.check_consistency().is_ok());
}

#[tokio::test]
async fn coordinator_shares_state_with_readers() {
    let mut orch = ScoredOrchestrator::with_agents(3, default_scored_profiles()).unwrap();
    orch.create_task("route", ScoredPriority::High, vec!["task_distribution".into()]);

    let coordinator = Coordinator::new(
        orch,
        CoordinatorSettings {
            tick_interval_ms: 1,
            error_backoff_ms: 1,
            max_ticks: Some(2),
        },
    );
    let state = coordinator.state();
    let (_tx, rx) = watch::channel(false);
    let stats = coordinator.start(rx).await.unwrap();

    assert_eq!(stats.tasks_assigned, 1);
    let snapshot = state.read().await;
    assert!(snapshot.queue().is_empty());
    assert_eq!(
        snapshot.tasks()[0].assigned_agent.as_deref(),
        Some("COORDINATION_COMMANDER")
    );
}
