use crate::scored::{ScoredOrchestrator, ScoredTask, ScoredTaskStatus, SystemState};
use async_trait::async_trait;
use conductor_core::ConductorResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

/// Timing of the coordinator loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    /// Pause between successful ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Pause after a failed tick.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    /// Stop after this many ticks. `None` runs until shutdown.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_error_backoff_ms() -> u64 {
    5000
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            max_ticks: None,
        }
    }
}

/// Executes the scored tasks a tick has assigned.
///
/// Called with no lock on the orchestrator state. The task has already been
/// started; the coordinator completes it with the returned outcome.
#[async_trait]
pub trait TickHook: Send + Sync {
    /// `Ok(true)` completes the task, `Ok(false)` fails it. An error fails
    /// the task and the tick.
    async fn run_task(&self, task: &ScoredTask) -> ConductorResult<bool>;
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Ticks run.
    pub ticks: u64,
    /// Ticks that returned an error.
    pub failed_ticks: u64,
    /// Tasks assigned across all ticks.
    pub tasks_assigned: u64,
}

/// Runs scored distribution on a fixed interval.
///
/// State lives behind a shared `RwLock` so other components can read
/// snapshots while the loop runs.
pub struct Coordinator {
    state: Arc<RwLock<ScoredOrchestrator>>,
    settings: CoordinatorSettings,
    hook: Option<Arc<dyn TickHook>>,
}

impl Coordinator {
    /// Coordinator owning `orchestrator`.
    pub fn new(orchestrator: ScoredOrchestrator, settings: CoordinatorSettings) -> Self {
        Self::with_shared(Arc::new(RwLock::new(orchestrator)), settings)
    }

    /// Coordinator over state shared with other readers.
    pub fn with_shared(
        state: Arc<RwLock<ScoredOrchestrator>>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            state,
            settings,
            hook: None,
        }
    }

    /// Run `hook` on every task the loop assigns.
    pub fn with_hook(mut self, hook: Arc<dyn TickHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Shared handle to the orchestrator state.
    pub fn state(&self) -> Arc<RwLock<ScoredOrchestrator>> {
        Arc::clone(&self.state)
    }

    /// One iteration: distribute and check consistency under the write lock,
    /// then run the hook on every assigned task with the lock released, then
    /// complete those tasks under the lock again.
    pub async fn tick(&self) -> ConductorResult<(usize, SystemState)> {
        let (assigned, state, started) = {
            let mut orchestrator = self.state.write().await;
            let assigned = orchestrator.distribute();
            orchestrator.check_consistency()?;
            let state = orchestrator.system_state();
            let started = match self.hook {
                Some(_) => start_assigned(&mut orchestrator)?,
                None => Vec::new(),
            };
            (assigned.len(), state, started)
        };
        let Some(hook) = &self.hook else {
            return Ok((assigned, state));
        };

        let mut outcomes = Vec::with_capacity(started.len());
        let mut first_error = None;
        for task in &started {
            let success = match hook.run_task(task).await {
                Ok(success) => success,
                Err(e) => {
                    warn!(task_id = %task.id, kind = %task.kind, error = %e, "Coordinator: task run failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    false
                }
            };
            outcomes.push((task.id, success));
        }

        {
            let mut orchestrator = self.state.write().await;
            for (id, success) in outcomes {
                orchestrator.complete_scored_task(id, success)?;
            }
            orchestrator.check_consistency()?;
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok((assigned, state)),
        }
    }

    /// Spawn the loop. It stops when `shutdown` flips to `true`, when the
    /// sender is dropped, or after `max_ticks`.
    pub fn start(self, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<CoordinatorStats> {
        tokio::spawn(async move {
            let interval = Duration::from_millis(self.settings.tick_interval_ms);
            let backoff = Duration::from_millis(self.settings.error_backoff_ms);
            let mut stats = CoordinatorStats::default();
            info!(
                interval_ms = self.settings.tick_interval_ms,
                max_ticks = ?self.settings.max_ticks,
                "Coordinator: starting"
            );

            loop {
                if *shutdown.borrow() {
                    break;
                }
                if self
                    .settings
                    .max_ticks
                    .is_some_and(|max| stats.ticks >= max)
                {
                    break;
                }

                stats.ticks += 1;
                let pause = match self.tick().await {
                    Ok((assigned, state)) => {
                        stats.tasks_assigned += assigned as u64;
                        debug!(
                            tick = stats.ticks,
                            assigned,
                            pending = state.pending_tasks,
                            load = state.system_load,
                            opportunities = ?state.optimization_opportunities,
                            "Coordinator: tick complete"
                        );
                        interval
                    }
                    Err(e) => {
                        stats.failed_ticks += 1;
                        error!(tick = stats.ticks, error = %e, "Coordinator: tick failed");
                        backoff
                    }
                };

                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            info!(
                ticks = stats.ticks,
                failed = stats.failed_ticks,
                assigned = stats.tasks_assigned,
                "Coordinator: stopped"
            );
            stats
        })
    }
}

/// Move every assigned task to active and return copies of them.
fn start_assigned(orchestrator: &mut ScoredOrchestrator) -> ConductorResult<Vec<ScoredTask>> {
    let ids: Vec<_> = orchestrator
        .tasks()
        .iter()
        .filter(|t| t.status == ScoredTaskStatus::Assigned)
        .map(|t| t.id)
        .collect();
    let mut started = Vec::with_capacity(ids.len());
    for id in ids {
        orchestrator.start_task(id)?;
        if let Some(task) = orchestrator.task(id) {
            started.push(task.clone());
        }
    }
    Ok(started)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scored::{ScoredAgent, ScoredPriority};

    fn fast_settings(max_ticks: Option<u64>) -> CoordinatorSettings {
        CoordinatorSettings {
            tick_interval_ms: 1,
            error_backoff_ms: 1,
            max_ticks,
        }
    }

    #[test]
    fn test_settings_defaults() {
        let settings: CoordinatorSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.tick_interval_ms, 1000);
        assert_eq!(settings.error_backoff_ms, 5000);
        assert!(settings.max_ticks.is_none());
    }

    #[tokio::test]
    async fn test_single_tick_distributes() {
        let mut orch = ScoredOrchestrator::default();
        orch.register_agent(ScoredAgent::new("A", "r", &["x"], &[]))
            .unwrap();
        orch.create_task("t", ScoredPriority::High, vec!["x".into()]);

        let coordinator = Coordinator::new(orch, fast_settings(None));
        let (assigned, state) = coordinator.tick().await.unwrap();
        assert_eq!(assigned, 1);
        assert_eq!(state.pending_tasks, 0);
        assert_eq!(state.active_agents, 1);
    }

    /// Reads the shared state while running a task.
    struct ReadingHook {
        state: Arc<RwLock<ScoredOrchestrator>>,
    }

    #[async_trait]
    impl TickHook for ReadingHook {
        async fn run_task(&self, task: &ScoredTask) -> ConductorResult<bool> {
            let snapshot = tokio::time::timeout(Duration::from_secs(1), self.state.read())
                .await
                .expect("state readable while a task runs");
            let seen = snapshot.task(task.id).map(|t| t.status);
            Ok(seen == Some(ScoredTaskStatus::Active))
        }
    }

    #[tokio::test]
    async fn test_hook_runs_without_state_lock() {
        let mut orch = ScoredOrchestrator::default();
        orch.register_agent(ScoredAgent::new("A", "r", &["x"], &[]))
            .unwrap();
        let id = orch.create_task("t", ScoredPriority::High, vec!["x".into()]);

        let coordinator = Coordinator::new(orch, fast_settings(None));
        let state = coordinator.state();
        let coordinator = coordinator.with_hook(Arc::new(ReadingHook {
            state: Arc::clone(&state),
        }));
        coordinator.tick().await.unwrap();

        let snapshot = state.read().await;
        assert_eq!(snapshot.task(id).unwrap().status, ScoredTaskStatus::Completed);
        assert_eq!(snapshot.in_flight("A"), 0);
    }

    #[tokio::test]
    async fn test_loop_stops_after_max_ticks() {
        let coordinator = Coordinator::new(ScoredOrchestrator::default(), fast_settings(Some(3)));
        let (_tx, rx) = watch::channel(false);
        let stats = coordinator.start(rx).await.unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.failed_ticks, 0);
    }

    #[tokio::test]
    async fn test_loop_stops_on_shutdown() {
        let coordinator = Coordinator::new(ScoredOrchestrator::default(), fast_settings(None));
        let (tx, rx) = watch::channel(false);
        let handle = coordinator.start(rx);
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        let stats = handle.await.unwrap();
        assert!(stats.ticks >= 1);
    }
}
