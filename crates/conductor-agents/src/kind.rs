use serde::{Deserialize, Serialize};
use std::fmt;

/// The worker agents that can handle tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerKind {
    /// Writes documentation frameworks and component docs.
    Documentation,
    /// Writes review guidelines, checklists and PR templates.
    CodeReview,
    /// Writes testing guidelines and coverage plans.
    Testing,
    /// Writes dashboards, logging settings and monitor configuration.
    Monitoring,
}

impl WorkerKind {
    /// Every worker, in registration order.
    pub const ALL: [WorkerKind; 4] = [
        WorkerKind::Documentation,
        WorkerKind::CodeReview,
        WorkerKind::Testing,
        WorkerKind::Monitoring,
    ];

    /// Agent name used in the orchestration roster.
    pub fn agent_name(self) -> &'static str {
        match self {
            WorkerKind::Documentation => "DocumentationAgent",
            WorkerKind::CodeReview => "CodeReviewAgent",
            WorkerKind::Testing => "TestingAgent",
            WorkerKind::Monitoring => "MonitoringAgent",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

/// Every task name a worker knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// `create_documentation_framework`
    CreateDocumentationFramework,
    /// `expand_documentation`
    ExpandDocumentation,
    /// `establish_code_review_process`
    EstablishCodeReviewProcess,
    /// `formalize_code_review`
    FormalizeCodeReview,
    /// `implement_basic_testing`
    ImplementBasicTesting,
    /// `improve_test_coverage`
    ImproveTestCoverage,
    /// `setup_performance_monitoring`
    SetupPerformanceMonitoring,
    /// `implement_performance_monitoring`
    ImplementPerformanceMonitoring,
}

impl TaskKind {
    /// Every task kind, grouped by owning worker.
    pub const ALL: [TaskKind; 8] = [
        TaskKind::CreateDocumentationFramework,
        TaskKind::ExpandDocumentation,
        TaskKind::EstablishCodeReviewProcess,
        TaskKind::FormalizeCodeReview,
        TaskKind::ImplementBasicTesting,
        TaskKind::ImproveTestCoverage,
        TaskKind::SetupPerformanceMonitoring,
        TaskKind::ImplementPerformanceMonitoring,
    ];

    /// Parse a task name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Snake-case task name as used in the priority lists.
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::CreateDocumentationFramework => "create_documentation_framework",
            TaskKind::ExpandDocumentation => "expand_documentation",
            TaskKind::EstablishCodeReviewProcess => "establish_code_review_process",
            TaskKind::FormalizeCodeReview => "formalize_code_review",
            TaskKind::ImplementBasicTesting => "implement_basic_testing",
            TaskKind::ImproveTestCoverage => "improve_test_coverage",
            TaskKind::SetupPerformanceMonitoring => "setup_performance_monitoring",
            TaskKind::ImplementPerformanceMonitoring => "implement_performance_monitoring",
        }
    }

    /// The one worker that owns this kind of task.
    pub fn worker(self) -> WorkerKind {
        match self {
            TaskKind::CreateDocumentationFramework | TaskKind::ExpandDocumentation => {
                WorkerKind::Documentation
            }
            TaskKind::EstablishCodeReviewProcess | TaskKind::FormalizeCodeReview => {
                WorkerKind::CodeReview
            }
            TaskKind::ImplementBasicTesting | TaskKind::ImproveTestCoverage => WorkerKind::Testing,
            TaskKind::SetupPerformanceMonitoring | TaskKind::ImplementPerformanceMonitoring => {
                WorkerKind::Monitoring
            }
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
