use crate::kind::{TaskKind, WorkerKind};
use async_trait::async_trait;
use conductor_core::{Artifact, ArtifactKind, ConductorError, ConductorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Metadata describing a worker and what it can do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    /// Which worker this is.
    pub kind: WorkerKind,
    /// Roster name, e.g. `DocumentationAgent`.
    pub name: String,
    /// Capabilities advertised to the orchestrator.
    pub capabilities: Vec<String>,
}

impl WorkerDescriptor {
    /// Descriptor named after `kind`.
    pub fn new(kind: WorkerKind, capabilities: &[&str]) -> Self {
        Self {
            kind,
            name: kind.agent_name().to_string(),
            capabilities: capabilities.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

/// A worker agent: turns a task into files under an output root.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Name, kind and capabilities of this worker.
    fn descriptor(&self) -> &WorkerDescriptor;

    /// Handle `task` under `root`. Only called with kinds this worker owns.
    async fn handle(&self, task: TaskKind, root: &Path) -> ConductorResult<Vec<Artifact>>;
}

/// Write `contents` to `root/relative`, creating parent directories.
pub(crate) async fn write_file(
    root: &Path,
    relative: &str,
    contents: &str,
    kind: ArtifactKind,
) -> ConductorResult<Artifact> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            ConductorError::Worker(format!("Cannot create {}: {e}", parent.display()))
        })?;
    }
    tokio::fs::write(&path, contents)
        .await
        .map_err(|e| ConductorError::Worker(format!("Cannot write {}: {e}", path.display())))?;
    debug!(path = %relative, bytes = contents.len(), "Wrote file");
    Ok(Artifact::new(kind, relative, contents.len()))
}

/// Like [`write_file`], but leaves an existing file alone and returns `None`.
pub(crate) async fn write_file_if_absent(
    root: &Path,
    relative: &str,
    contents: &str,
    kind: ArtifactKind,
) -> ConductorResult<Option<Artifact>> {
    if tokio::fs::try_exists(root.join(relative))
        .await
        .unwrap_or(false)
    {
        debug!(path = %relative, "File exists, keeping it");
        return Ok(None);
    }
    write_file(root, relative, contents, kind).await.map(Some)
}

pub(crate) fn not_owned(worker: WorkerKind, task: TaskKind) -> ConductorError {
    ConductorError::Worker(format!("{worker} does not handle '{task}'"))
}
