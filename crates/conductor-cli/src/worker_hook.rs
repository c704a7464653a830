use async_trait::async_trait;
use conductor_agents::WorkerPool;
use conductor_core::ConductorResult;
use conductor_orchestrator::{ScoredTask, TickHook};
use tracing::{error, info, warn};

/// Runs every task the coordinator just assigned through the worker pool.
/// Kinds no worker owns and worker errors count as failed tasks.
pub struct WorkerHook {
    pool: WorkerPool,
}

impl WorkerHook {
    /// Hook backed by `pool`.
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TickHook for WorkerHook {
    async fn run_task(&self, task: &ScoredTask) -> ConductorResult<bool> {
        Ok(match self.pool.handle_task(&task.kind).await {
            Ok(Some(artifacts)) => {
                info!(task = %task.kind, artifacts = artifacts.len(), "Scored task executed");
                true
            }
            Ok(None) => {
                warn!(task = %task.kind, "No worker owns this task kind");
                false
            }
            Err(e) => {
                error!(task = %task.kind, error = %e, "Scored task failed");
                false
            }
        })
    }
}
