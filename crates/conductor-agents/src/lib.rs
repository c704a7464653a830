//! Worker agents for Conductor.
//!
//! Each worker owns a fixed set of task kinds and handles them by writing
//! template files under an output root. [`TaskKind`] maps every known task
//! name to exactly one [`WorkerKind`], and the [`WorkerPool`] plugs the
//! workers into the orchestrator as a [`conductor_orchestrator::TaskExecutor`].

/// Code review process files.
pub mod code_review;
/// Documentation framework files.
pub mod documentation;
/// Task and worker kinds.
pub mod kind;
/// Monitoring templates and configuration.
pub mod monitoring;
/// Worker pool and task dispatch.
pub mod pool;
/// Testing guidelines and templates.
pub mod testing;
/// The `Worker` trait.
pub mod worker;

pub use code_review::CodeReviewWorker;
pub use documentation::{DocumentationWorker, DOCUMENTED_COMPONENTS};
pub use kind::{TaskKind, WorkerKind};
pub use monitoring::{
    MonitorFileConfig, MonitoringWorker, LOGGING_CONFIG_PATH, MONITOR_CONFIG_PATH,
    MONITOR_SCRIPT_PATH,
};
pub use pool::WorkerPool;
pub use testing::TestingWorker;
pub use worker::{Worker, WorkerDescriptor};
