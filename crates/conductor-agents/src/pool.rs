use crate::code_review::CodeReviewWorker;
use crate::documentation::DocumentationWorker;
use crate::kind::{TaskKind, WorkerKind};
use crate::monitoring::MonitoringWorker;
use crate::testing::TestingWorker;
use crate::worker::{Worker, WorkerDescriptor};
use async_trait::async_trait;
use conductor_core::{Artifact, ConductorError, ConductorResult};
use conductor_orchestrator::{Task, TaskExecutor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The set of workers, each writing under one shared output root.
pub struct WorkerPool {
    output_root: PathBuf,
    workers: HashMap<WorkerKind, Arc<dyn Worker>>,
}

impl WorkerPool {
    /// An empty pool.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            workers: HashMap::new(),
        }
    }

    /// A pool holding all four built-in workers.
    pub fn with_defaults(output_root: impl Into<PathBuf>) -> Self {
        let mut pool = Self::new(output_root);
        pool.register(Arc::new(DocumentationWorker::new()));
        pool.register(Arc::new(CodeReviewWorker::new()));
        pool.register(Arc::new(TestingWorker::new()));
        pool.register(Arc::new(MonitoringWorker::new()));
        pool
    }

    /// Add a worker, replacing any earlier one of the same kind.
    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        let kind = worker.descriptor().kind;
        info!(worker = %kind, "Registered worker");
        self.workers.insert(kind, worker);
    }

    /// The registered worker of `kind`.
    pub fn get(&self, kind: WorkerKind) -> Option<&Arc<dyn Worker>> {
        self.workers.get(&kind)
    }

    /// Descriptors of the registered workers in [`WorkerKind::ALL`] order.
    pub fn descriptors(&self) -> Vec<&WorkerDescriptor> {
        WorkerKind::ALL
            .iter()
            .filter_map(|k| self.workers.get(k))
            .map(|w| w.descriptor())
            .collect()
    }

    /// Directory workers write under.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run the worker that owns `task_name`.
    ///
    /// Returns `Ok(None)` when no worker knows the name.
    pub async fn handle_task(&self, task_name: &str) -> ConductorResult<Option<Vec<Artifact>>> {
        let Some(kind) = TaskKind::from_name(task_name) else {
            debug!(task = %task_name, "No worker handles this task");
            return Ok(None);
        };
        let worker = self.workers.get(&kind.worker()).ok_or_else(|| {
            ConductorError::Worker(format!("{} is not registered", kind.worker()))
        })?;
        worker.handle(kind, &self.output_root).await.map(Some)
    }
}

#[async_trait]
impl TaskExecutor for WorkerPool {
    async fn execute(&self, agent: &str, task: &Task) -> ConductorResult<Vec<Artifact>> {
        if let Some(kind) = TaskKind::from_name(&task.name) {
            let owner = kind.worker().agent_name();
            if owner != agent {
                warn!(
                    task = %task.name,
                    agent = %agent,
                    owner = %owner,
                    "Task assigned to an agent that does not own it, running the owner"
                );
            }
        }
        Ok(self.handle_task(&task.name).await?.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_has_all_workers() {
        let pool = WorkerPool::with_defaults("out");
        let names: Vec<&str> = pool.descriptors().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "DocumentationAgent",
                "CodeReviewAgent",
                "TestingAgent",
                "MonitoringAgent"
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_task_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WorkerPool::with_defaults(dir.path());
        assert!(pool.handle_task("write_poetry").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_worker_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WorkerPool::new(dir.path());
        assert!(pool.handle_task("implement_basic_testing").await.is_err());
    }
}
