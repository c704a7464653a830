//! Orchestration configuration: agent roster, priority lists and the
//! task-name → capability table.
//!
//! The file is JSON. A missing file is replaced by [`OrchestrationConfig::default`]
//! and written back; a malformed file is logged and the default is used
//! without touching the file.

use crate::types::TaskPriority;
use conductor_core::{ConductorError, ConductorResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{error, info, warn};

/// One entry of the agent roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique agent name.
    pub name: String,
    /// Capabilities the agent offers.
    pub capabilities: Vec<String>,
}

impl AgentConfig {
    /// Roster entry from string slices.
    pub fn new(name: &str, capabilities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            capabilities: capabilities.iter().map(|c| (*c).to_string()).collect(),
        }
    }
}

/// Static task lists per priority tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPriorities {
    /// Tasks queued first.
    #[serde(default)]
    pub immediate: Vec<String>,
    /// Tasks queued after the immediate tier.
    #[serde(default)]
    pub short_term: Vec<String>,
    /// Tasks queued last.
    #[serde(default)]
    pub medium_term: Vec<String>,
}

impl TaskPriorities {
    /// Task names of one tier.
    pub fn tier(&self, priority: TaskPriority) -> &[String] {
        match priority {
            TaskPriority::Immediate => &self.immediate,
            TaskPriority::ShortTerm => &self.short_term,
            TaskPriority::MediumTerm => &self.medium_term,
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from the file on disk.
    File,
    /// File was missing; default generated and written back.
    GeneratedDefault,
    /// File could not be parsed; default used, file untouched.
    FallbackDefault,
}

/// The full orchestration configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Agent roster, in registration order.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    /// Task names per tier.
    #[serde(default)]
    pub task_priorities: TaskPriorities,
    /// Task name to the capability it requires.
    #[serde(default)]
    pub capability_map: BTreeMap<String, String>,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        let capability_map = [
            ("create_documentation_framework", "create_documentation"),
            ("establish_code_review_process", "review_code"),
            ("implement_basic_testing", "create_tests"),
            ("setup_performance_monitoring", "monitor_performance"),
        ]
        .into_iter()
        .map(|(task, cap)| (task.to_string(), cap.to_string()))
        .collect();

        Self {
            agents: vec![
                AgentConfig::new(
                    "DocumentationAgent",
                    &["create_documentation", "update_templates"],
                ),
                AgentConfig::new("CodeReviewAgent", &["review_code", "enforce_standards"]),
                AgentConfig::new(
                    "TestingAgent",
                    &["create_tests", "run_tests", "analyze_coverage"],
                ),
                AgentConfig::new("MonitoringAgent", &["monitor_performance", "log_metrics"]),
            ],
            task_priorities: TaskPriorities {
                immediate: vec![
                    "create_documentation_framework".to_string(),
                    "establish_code_review_process".to_string(),
                ],
                short_term: vec![
                    "implement_basic_testing".to_string(),
                    "setup_performance_monitoring".to_string(),
                ],
                medium_term: vec![
                    "expand_documentation".to_string(),
                    "formalize_code_review".to_string(),
                    "improve_test_coverage".to_string(),
                ],
            },
            capability_map,
        }
    }
}

impl OrchestrationConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> ConductorResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConductorError::Config(format!("Invalid orchestration config: {e}")))
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> ConductorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load the configuration from `path`, falling back to the default.
    ///
    /// Never fails: every problem is logged and resolved to a usable config.
    pub async fn load_or_init(path: &Path) -> (Self, ConfigSource) {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Configuration file not found, creating a default configuration"
            );
            let config = Self::default();
            if let Err(e) = config.save(path).await {
                error!(path = %path.display(), error = %e, "Failed to write default configuration");
            }
            return (config, ConfigSource::GeneratedDefault);
        }

        match Self::load(path).await {
            Ok(config) => {
                info!(path = %path.display(), agents = config.agents.len(), "Configuration loaded");
                (config, ConfigSource::File)
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load configuration, using default"
                );
                (Self::default(), ConfigSource::FallbackDefault)
            }
        }
    }

    /// Load the configuration from `path`, propagating any error.
    pub async fn load(path: &Path) -> ConductorResult<Self> {
        let data = tokio::fs::read_to_string(path).await?;
        Self::from_json(&data)
    }

    /// Write the configuration to `path` as pretty JSON.
    pub async fn save(&self, path: &Path) -> ConductorResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.to_json()?).await?;
        Ok(())
    }

    /// Capability required by `task_name`, if the task is known.
    pub fn required_capability(&self, task_name: &str) -> Option<&str> {
        self.capability_map.get(task_name).map(String::as_str)
    }

    /// Check the roster for duplicates and warn about unreachable tasks.
    ///
    /// Duplicate agent names are an error; capabilities no agent provides and
    /// priority tasks missing from the capability map are only warnings.
    pub fn validate(&self) -> ConductorResult<()> {
        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.is_empty() {
                return Err(ConductorError::Config("Agent with empty name".to_string()));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(ConductorError::Config(format!(
                    "Duplicate agent name '{}'",
                    agent.name
                )));
            }
        }

        let provided: HashSet<&str> = self
            .agents
            .iter()
            .flat_map(|a| a.capabilities.iter().map(String::as_str))
            .collect();

        for (task, capability) in &self.capability_map {
            if !provided.contains(capability.as_str()) {
                warn!(task = %task, capability = %capability, "No agent provides this capability");
            }
        }

        for tier in TaskPriority::ALL {
            for task in self.task_priorities.tier(tier) {
                if !self.capability_map.contains_key(task) {
                    warn!(task = %task, tier = %tier, "Priority task has no capability mapping");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let config = OrchestrationConfig::default();
        assert_eq!(config.agents.len(), 4);
        assert_eq!(config.task_priorities.immediate.len(), 2);
        assert_eq!(config.task_priorities.medium_term.len(), 3);
        assert_eq!(
            config.required_capability("establish_code_review_process"),
            Some("review_code")
        );
        assert!(config.required_capability("expand_documentation").is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&OrchestrationConfig::default().to_json().unwrap()).unwrap();
        assert!(json["agents"].is_array());
        assert_eq!(json["agents"][0]["name"], "DocumentationAgent");
        assert!(json["task_priorities"]["short_term"].is_array());
        assert_eq!(
            json["capability_map"]["implement_basic_testing"],
            "create_tests"
        );
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config = OrchestrationConfig::from_json(r#"{"agents": []}"#).unwrap();
        assert!(config.capability_map.is_empty());
        assert!(config.task_priorities.immediate.is_empty());
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let mut config = OrchestrationConfig::default();
        config
            .agents
            .push(AgentConfig::new("TestingAgent", &["run_tests"]));
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orchestration_config.json");

        let config = OrchestrationConfig::default();
        config.save(&path).await.unwrap();
        let loaded = OrchestrationConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_missing_file_generates_and_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let (config, source) = OrchestrationConfig::load_or_init(&path).await;
        assert_eq!(source, ConfigSource::GeneratedDefault);
        assert_eq!(config, OrchestrationConfig::default());
        assert!(path.exists());

        let (reloaded, source) = OrchestrationConfig::load_or_init(&path).await;
        assert_eq!(source, ConfigSource::File);
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_malformed_file_falls_back_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let (config, source) = OrchestrationConfig::load_or_init(&path).await;
        assert_eq!(source, ConfigSource::FallbackDefault);
        assert_eq!(config, OrchestrationConfig::default());

        let on_disk = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(on_disk, "{ not json");
    }
}
