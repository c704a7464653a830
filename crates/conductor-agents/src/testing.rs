use crate::kind::{TaskKind, WorkerKind};
use crate::worker::{not_owned, write_file, Worker, WorkerDescriptor};
use async_trait::async_trait;
use conductor_core::{Artifact, ArtifactKind, ConductorResult};
use std::path::Path;
use tracing::info;

const TESTING_GUIDELINES: &str = "\
# Testing Guidelines

## Layout
- Unit tests live next to the code they cover
- Integration tests live in each package's `tests/` directory
- Shared fixtures use temporary directories, never the working tree

## Running
- Run the whole suite before opening a pull request
- A failing test blocks the merge

## Writing Tests
- One behaviour per test
- Name tests after the behaviour they check
- Cover error paths as well as the happy path
";

const TEST_REPORT_TEMPLATE: &str = "\
# Testing Report

## Test Execution Summary
- Total Tests Run:
- Passed:
- Failed:
- Coverage:

## Detailed Results
### DocumentationAgent Tests
- Status:
- Details:

### CodeReviewAgent Tests
- Status:
- Details:

## Recommendations
";

/// Checklist of behaviours each component's tests must cover.
const COVERAGE_PLAN: &[(&str, &[&str])] = &[
    (
        "DocumentationAgent",
        &[
            "starts idle with the create_documentation capability",
            "create_documentation_framework writes README, component and guideline templates",
            "expand_documentation writes one page per component",
        ],
    ),
    (
        "CodeReviewAgent",
        &[
            "starts idle with the review_code capability",
            "establish_code_review_process writes guidelines and coding standards",
            "establish_code_review_process keeps an existing PR template",
            "formalize_code_review replaces the standards and adds a checklist",
        ],
    ),
    (
        "Orchestrator",
        &[
            "loads the agent roster from configuration",
            "starts with an empty task queue",
            "assigning a task moves the agent to working",
            "completing a task returns the agent to idle",
        ],
    ),
];

fn coverage_plan() -> String {
    let mut plan = String::from("# Test Coverage Plan\n");
    for (component, cases) in COVERAGE_PLAN {
        plan.push_str(&format!("\n## {component}\n"));
        for case in *cases {
            plan.push_str(&format!("- [ ] {case}\n"));
        }
    }
    plan
}

/// Writes testing guidelines, report templates and the coverage plan under `tests/`.
pub struct TestingWorker {
    descriptor: WorkerDescriptor,
}

impl TestingWorker {
    /// Worker advertising the testing capabilities.
    pub fn new() -> Self {
        Self {
            descriptor: WorkerDescriptor::new(
                WorkerKind::Testing,
                &["create_tests", "run_tests", "analyze_coverage", "report_results"],
            ),
        }
    }
}

impl Default for TestingWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for TestingWorker {
    fn descriptor(&self) -> &WorkerDescriptor {
        &self.descriptor
    }

    async fn handle(&self, task: TaskKind, root: &Path) -> ConductorResult<Vec<Artifact>> {
        let artifacts = match task {
            TaskKind::ImplementBasicTesting => vec![
                write_file(
                    root,
                    "tests/TESTING_GUIDELINES.md",
                    TESTING_GUIDELINES,
                    ArtifactKind::Documentation,
                )
                .await?,
                write_file(
                    root,
                    "tests/TEST_REPORT_TEMPLATE.md",
                    TEST_REPORT_TEMPLATE,
                    ArtifactKind::Template,
                )
                .await?,
            ],
            TaskKind::ImproveTestCoverage => vec![
                write_file(
                    root,
                    "tests/COVERAGE_PLAN.md",
                    &coverage_plan(),
                    ArtifactKind::Documentation,
                )
                .await?,
            ],
            other => return Err(not_owned(self.descriptor.kind, other)),
        };
        info!(task = %task, files = artifacts.len(), "Testing files written");
        Ok(artifacts)
    }
}
