use crate::kind::{TaskKind, WorkerKind};
use crate::worker::{not_owned, write_file, write_file_if_absent, Worker, WorkerDescriptor};
use async_trait::async_trait;
use conductor_core::{Artifact, ArtifactKind, ConductorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Relative path of the monitoring configuration file.
pub const MONITOR_CONFIG_PATH: &str = "monitoring/monitor_config.json";

/// Relative path of the logging settings sourced by the monitor script.
pub const LOGGING_CONFIG_PATH: &str = "monitoring/logging.conf";

/// Relative path of the script that runs the performance monitor.
pub const MONITOR_SCRIPT_PATH: &str = "monitoring/performance_monitor.sh";

// `RUST_LOG` takes tracing-subscriber `EnvFilter` directives.
const LOGGING_CONFIG: &str = "\
# Logging for monitoring/performance_monitor.sh
RUST_LOG=info
CONDUCTOR_LOG_FORMAT=json
CONDUCTOR_LOG_FILE=monitoring/app.log
";

const DASHBOARD_TEMPLATE: &str = "\
# Performance Metrics Dashboard

## System Metrics
| Metric | Value | Status |
|--------|-------|--------|
| CPU Usage | {cpu_percent}% | {cpu_status} |
| Memory Usage | {memory_percent}% | {memory_status} |
| Disk Usage | {disk_percent}% | {disk_status} |

## Application Metrics
| Component | Requests/sec | Avg Response Time | Error Rate |
|-----------|--------------|------------------|------------|
| API | - | - | - |
| Database | - | - | - |
| Cache | - | - | - |

## Alerts
{alerts}
";

const REPORT_TEMPLATE: &str = "\
# Monitoring Report

## Report Period
From:
To:

## System Health
- Overall Status:
- Peak CPU Usage:
- Peak Memory Usage:
- Disk Space Remaining:

## Application Performance
- Uptime:
- Average Response Time:
- Error Rate:

## Issues Detected
1.
2.
3.

## Recommendations
";

/// Contents of `monitoring/monitor_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorFileConfig {
    /// Seconds between samples.
    pub monitoring_interval: u64,
    /// Percent above which a resource raises a warning.
    pub alert_thresholds: BTreeMap<String, f64>,
}

impl Default for MonitorFileConfig {
    fn default() -> Self {
        Self {
            monitoring_interval: 60,
            alert_thresholds: ["cpu_percent", "memory_percent", "disk_percent"]
                .into_iter()
                .map(|k| (k.to_string(), 80.0))
                .collect(),
        }
    }
}

/// Shell script that samples host metrics every `interval` seconds, with
/// logs appended to the file named in the logging config.
fn monitor_script(interval: u64) -> String {
    format!(
        "\
#!/bin/sh
# Samples host metrics until interrupted. Extra arguments go to `conductor monitor`.
set -eu
cd \"$(dirname \"$0\")/..\"
if [ -f {LOGGING_CONFIG_PATH} ]; then
    set -a
    . ./{LOGGING_CONFIG_PATH}
    set +a
fi
exec conductor monitor --interval {interval} \\
    --log-format \"${{CONDUCTOR_LOG_FORMAT:-pretty}}\" \"$@\" \\
    2>>\"${{CONDUCTOR_LOG_FILE:-monitoring/app.log}}\"
"
    )
}

async fn write_script(root: &Path, interval: u64) -> ConductorResult<Artifact> {
    let artifact = write_file(
        root,
        MONITOR_SCRIPT_PATH,
        &monitor_script(interval),
        ArtifactKind::Script,
    )
    .await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let path = root.join(MONITOR_SCRIPT_PATH);
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).await?;
    }
    Ok(artifact)
}

/// Writes the monitoring dashboard, report template, logging settings,
/// monitor script and configuration.
pub struct MonitoringWorker {
    descriptor: WorkerDescriptor,
}

impl MonitoringWorker {
    /// Worker advertising the monitoring capabilities.
    pub fn new() -> Self {
        Self {
            descriptor: WorkerDescriptor::new(
                WorkerKind::Monitoring,
                &[
                    "monitor_performance",
                    "log_metrics",
                    "alert_on_issues",
                    "generate_reports",
                ],
            ),
        }
    }

    async fn setup(&self, root: &Path) -> ConductorResult<Vec<Artifact>> {
        let mut artifacts = vec![
            write_file(
                root,
                "monitoring/DASHBOARD_TEMPLATE.md",
                DASHBOARD_TEMPLATE,
                ArtifactKind::Template,
            )
            .await?,
            write_file(
                root,
                "monitoring/MONITORING_REPORT_TEMPLATE.md",
                REPORT_TEMPLATE,
                ArtifactKind::Template,
            )
            .await?,
        ];
        let defaults = MonitorFileConfig::default();
        let config = serde_json::to_string_pretty(&defaults)?;
        for (path, contents) in [
            (LOGGING_CONFIG_PATH, LOGGING_CONFIG),
            (MONITOR_CONFIG_PATH, config.as_str()),
        ] {
            if let Some(written) =
                write_file_if_absent(root, path, contents, ArtifactKind::Config).await?
            {
                artifacts.push(written);
            }
        }
        artifacts.push(write_script(root, defaults.monitoring_interval).await?);
        Ok(artifacts)
    }

    async fn implement(&self, root: &Path) -> ConductorResult<Vec<Artifact>> {
        let defaults = MonitorFileConfig::default();
        let config = serde_json::to_string_pretty(&defaults)?;
        let mut artifacts = vec![
            write_file(root, MONITOR_CONFIG_PATH, &config, ArtifactKind::Config).await?,
        ];
        if let Some(written) =
            write_file_if_absent(root, LOGGING_CONFIG_PATH, LOGGING_CONFIG, ArtifactKind::Config)
                .await?
        {
            artifacts.push(written);
        }
        artifacts.push(write_script(root, defaults.monitoring_interval).await?);
        Ok(artifacts)
    }
}

impl Default for MonitoringWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for MonitoringWorker {
    fn descriptor(&self) -> &WorkerDescriptor {
        &self.descriptor
    }

    async fn handle(&self, task: TaskKind, root: &Path) -> ConductorResult<Vec<Artifact>> {
        let artifacts = match task {
            TaskKind::SetupPerformanceMonitoring => self.setup(root).await?,
            TaskKind::ImplementPerformanceMonitoring => self.implement(root).await?,
            other => return Err(not_owned(self.descriptor.kind, other)),
        };
        info!(task = %task, files = artifacts.len(), "Monitoring files written");
        Ok(artifacts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_shape() {
        let json = serde_json::to_value(MonitorFileConfig::default()).unwrap();
        assert_eq!(json["monitoring_interval"], 60);
        assert_eq!(json["alert_thresholds"]["disk_percent"], 80.0);
    }

    #[test]
    fn test_monitor_script_uses_interval_and_logging_config() {
        let script = monitor_script(15);
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("conductor monitor --interval 15"));
        assert!(script.contains(". ./monitoring/logging.conf"));
        assert!(script.contains("${CONDUCTOR_LOG_FILE:-monitoring/app.log}"));
    }

    #[tokio::test]
    async fn test_implement_overwrites_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MONITOR_CONFIG_PATH);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}").unwrap();

        MonitoringWorker::new()
            .handle(TaskKind::ImplementPerformanceMonitoring, dir.path())
            .await
            .unwrap();

        let parsed: MonitorFileConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, MonitorFileConfig::default());
    }
}
