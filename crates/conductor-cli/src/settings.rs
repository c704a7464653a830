//! Runtime settings read from `conductor.toml`.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use conductor_core::JsonReportStore;
use conductor_monitor::MonitorSettings;
use conductor_orchestrator::{CoordinatorSettings, DEFAULT_MAX_CONCURRENT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Contents of `conductor.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Memory database and saved reports live here.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Root under which worker agents write their templates.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Orchestrator config path and timing.
    #[serde(default)]
    pub orchestrator: OrchestratorSection,
    /// Metric sampling and alerting.
    #[serde(default)]
    pub monitor: MonitorSettings,
    /// Tool server and memory store options.
    #[serde(default)]
    pub mcp: McpSection,
}

/// `[orchestrator]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSection {
    /// JSON roster, priority lists and capability map.
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,
    /// Milliseconds between coordinator ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Pause after a failed tick.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    /// Per-agent concurrency cap.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks_per_agent: usize,
}

/// `[mcp]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpSection {
    /// Defaults to `<data_dir>/memory.db`.
    #[serde(default)]
    pub memory_db: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_config_path() -> PathBuf {
    PathBuf::from("enhanced_orchestration_config.json")
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_error_backoff_ms() -> u64 {
    5000
}
fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            tick_interval_ms: default_tick_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            max_concurrent_tasks_per_agent: default_max_concurrent(),
        }
    }
}

impl OrchestratorSection {
    /// Coordinator timing with an optional tick limit.
    pub fn coordinator_settings(&self, max_ticks: Option<u64>) -> CoordinatorSettings {
        CoordinatorSettings {
            tick_interval_ms: self.tick_interval_ms,
            error_backoff_ms: self.error_backoff_ms,
            max_ticks,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            orchestrator: OrchestratorSection::default(),
            monitor: MonitorSettings::default(),
            mcp: McpSection::default(),
        }
    }
}

impl Settings {
    /// Parse settings text; missing fields take their defaults.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).map_err(|e| anyhow::anyhow!("Invalid settings: {e}"))
    }

    /// Serialize as pretty TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read `path`; a missing file yields the defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read settings file '{}': {e}", path.display())
        })?;
        let settings = Self::from_toml(&text)?;
        info!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Memory database path: `[mcp] memory_db` or `<data_dir>/memory.db`.
    pub fn memory_db_path(&self) -> PathBuf {
        self.mcp
            .memory_db
            .clone()
            .unwrap_or_else(|| self.data_dir.join("memory.db"))
    }

    /// Report store under `<data_dir>/reports`.
    pub fn reports(&self) -> JsonReportStore {
        JsonReportStore::new(self.data_dir.join("reports"))
    }
}
