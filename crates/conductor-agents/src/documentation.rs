use crate::kind::{TaskKind, WorkerKind};
use crate::worker::{not_owned, write_file, Worker, WorkerDescriptor};
use async_trait::async_trait;
use conductor_core::{Artifact, ArtifactKind, ConductorResult};
use std::path::Path;
use tracing::info;

const README_TEMPLATE: &str = "\
# Project Documentation

## Overview
Brief description of the project.

## Getting Started
Instructions to set up and run the project.

## Components
Description of key components.

## API Reference (if applicable)
Details about APIs.

## Contributing
Guidelines for contributing to the project.

## License
Project license information.
";

const COMPONENT_TEMPLATE: &str = "\
# {component_name}

## Description
Brief description of the component.

## Purpose
What is this component used for?

## Usage
How to use this component.

## Dependencies
List of dependencies.

## API
Details of the component's API (if applicable).

## Examples
Code examples demonstrating usage.
";

const GUIDELINES: &str = "\
# Documentation Guidelines

## Style Guide
- Use clear, concise language
- Include code examples where relevant
- Keep documentation up-to-date with code changes

## Template Usage
- Use README_TEMPLATE.md for project overviews
- Use COMPONENT_TEMPLATE.md for individual components

## Review Process
- All documentation should be reviewed before merging
- Check for accuracy and completeness
";

/// Components that get their own page when documentation is expanded.
pub const DOCUMENTED_COMPONENTS: [&str; 5] = [
    "MULTI_AGENT_ORCHESTRATOR",
    "DOCUMENTATION_AGENT",
    "CODE_REVIEW_AGENT",
    "TESTING_AGENT",
    "MONITORING_AGENT",
];

fn component_page(component: &str) -> String {
    format!(
        "# {component}\n\n\
         ## Description\n\
         Documentation for the {component} component of the multi-agent orchestration system.\n\n\
         ## Purpose\n\
         This component is responsible for...\n\n\
         ## Usage\n\
         To use this component...\n\n\
         ## Dependencies\n\
         List of dependencies for {component}...\n\n\
         ## API\n\
         Details of the component's API...\n\n\
         ## Examples\n\
         Code examples demonstrating usage...\n"
    )
}

/// Writes the documentation framework and per-component pages under `docs/`.
pub struct DocumentationWorker {
    descriptor: WorkerDescriptor,
}

impl DocumentationWorker {
    /// Worker advertising the documentation capabilities.
    pub fn new() -> Self {
        Self {
            descriptor: WorkerDescriptor::new(
                WorkerKind::Documentation,
                &["create_documentation", "update_templates", "review_content"],
            ),
        }
    }

    async fn create_framework(&self, root: &Path) -> ConductorResult<Vec<Artifact>> {
        Ok(vec![
            write_file(root, "docs/README_TEMPLATE.md", README_TEMPLATE, ArtifactKind::Template)
                .await?,
            write_file(
                root,
                "docs/COMPONENT_TEMPLATE.md",
                COMPONENT_TEMPLATE,
                ArtifactKind::Template,
            )
            .await?,
            write_file(
                root,
                "docs/DOCUMENTATION_GUIDELINES.md",
                GUIDELINES,
                ArtifactKind::Documentation,
            )
            .await?,
        ])
    }

    async fn expand(&self, root: &Path) -> ConductorResult<Vec<Artifact>> {
        let mut artifacts = Vec::with_capacity(DOCUMENTED_COMPONENTS.len());
        for component in DOCUMENTED_COMPONENTS {
            let relative = format!("docs/{component}_DOCUMENTATION.md");
            artifacts.push(
                write_file(
                    root,
                    &relative,
                    &component_page(component),
                    ArtifactKind::Documentation,
                )
                .await?,
            );
        }
        Ok(artifacts)
    }
}

impl Default for DocumentationWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for DocumentationWorker {
    fn descriptor(&self) -> &WorkerDescriptor {
        &self.descriptor
    }

    async fn handle(&self, task: TaskKind, root: &Path) -> ConductorResult<Vec<Artifact>> {
        let artifacts = match task {
            TaskKind::CreateDocumentationFramework => self.create_framework(root).await?,
            TaskKind::ExpandDocumentation => self.expand(root).await?,
            other => return Err(not_owned(self.descriptor.kind, other)),
        };
        info!(task = %task, files = artifacts.len(), "Documentation written");
        Ok(artifacts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_framework_files() {
        let dir = tempfile::tempdir().unwrap();
        let worker = DocumentationWorker::new();
        let artifacts = worker
            .handle(TaskKind::CreateDocumentationFramework, dir.path())
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 3);
        let readme = std::fs::read_to_string(dir.path().join("docs/README_TEMPLATE.md")).unwrap();
        assert!(readme.starts_with("# Project Documentation"));
        assert!(dir.path().join("docs/COMPONENT_TEMPLATE.md").exists());
    }

    #[tokio::test]
    async fn test_expand_writes_component_pages() {
        let dir = tempfile::tempdir().unwrap();
        let worker = DocumentationWorker::new();
        let artifacts = worker
            .handle(TaskKind::ExpandDocumentation, dir.path())
            .await
            .unwrap();

        assert_eq!(artifacts.len(), 5);
        let page = std::fs::read_to_string(
            dir.path()
                .join("docs/TESTING_AGENT_DOCUMENTATION.md"),
        )
        .unwrap();
        assert!(page.contains("List of dependencies for TESTING_AGENT"));
    }

    #[tokio::test]
    async fn test_rejects_foreign_task() {
        let dir = tempfile::tempdir().unwrap();
        let worker = DocumentationWorker::new();
        assert!(worker
            .handle(TaskKind::ImplementBasicTesting, dir.path())
            .await
            .is_err());
    }
}
