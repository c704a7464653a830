use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of file produced by a worker agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Prose documentation (guidelines, component docs).
    Documentation,
    /// A template meant to be filled in by a human.
    Template,
    /// Machine-readable configuration (JSON, logging config).
    Config,
    /// A generated report.
    Report,
    /// An executable helper script.
    Script,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Documentation => write!(f, "documentation"),
            ArtifactKind::Template => write!(f, "template"),
            ArtifactKind::Config => write!(f, "config"),
            ArtifactKind::Report => write!(f, "report"),
            ArtifactKind::Script => write!(f, "script"),
        }
    }
}

/// A file written to disk while handling a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// What the file is.
    pub kind: ArtifactKind,
    /// Path relative to the output root.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: usize,
    /// When the file was written.
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Creates a new artifact record stamped with the current time.
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>, bytes: usize) -> Self {
        Self {
            kind,
            path: path.into(),
            bytes,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_creation() {
        let artifact = Artifact::new(ArtifactKind::Template, "docs/README_TEMPLATE.md", 42);
        assert_eq!(artifact.kind, ArtifactKind::Template);
        assert_eq!(artifact.path, PathBuf::from("docs/README_TEMPLATE.md"));
        assert_eq!(artifact.bytes, 42);
    }

    #[test]
    fn test_artifact_kind_display() {
        assert_eq!(ArtifactKind::Documentation.to_string(), "documentation");
        assert_eq!(ArtifactKind::Config.to_string(), "config");
        assert_eq!(ArtifactKind::Script.to_string(), "script");
    }
}
