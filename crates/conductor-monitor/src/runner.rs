use crate::monitor::PerformanceMonitor;
use crate::source::MetricSource;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info};

/// Timing of the collection loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Seconds between collections.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// History kept per metric. Together with `interval_secs` this sets the
    /// history length of every metric; `None` keeps per-category lengths.
    #[serde(default)]
    pub retention_secs: Option<u64>,
    /// Stop after this many collections. `None` runs until shutdown.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

fn default_interval_secs() -> u64 {
    10
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retention_secs: None,
            max_ticks: None,
        }
    }
}

impl MonitorSettings {
    /// Monitor sized by these settings.
    pub fn build_monitor(&self) -> PerformanceMonitor {
        match self.retention_secs {
            Some(retention) => PerformanceMonitor::new()
                .with_history_capacity((retention / self.interval_secs.max(1)).max(1) as usize),
            None => PerformanceMonitor::new(),
        }
    }
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Collections run.
    pub ticks: u64,
    /// Samples recorded.
    pub samples: u64,
    /// Alerts raised.
    pub alerts: u64,
    /// Rule firings seen.
    pub rules_fired: u64,
    /// Source collections that failed.
    pub failed_collections: u64,
}

/// Samples every source on a fixed interval and feeds the shared monitor.
pub struct MonitorRunner {
    monitor: Arc<RwLock<PerformanceMonitor>>,
    sources: Vec<Arc<dyn MetricSource>>,
    settings: MonitorSettings,
}

impl MonitorRunner {
    /// Runner over a fresh monitor sized by `settings`.
    pub fn new(settings: MonitorSettings) -> Self {
        let monitor = settings.build_monitor();
        Self::with_shared(Arc::new(RwLock::new(monitor)), settings)
    }

    /// Runner feeding an existing monitor.
    pub fn with_shared(monitor: Arc<RwLock<PerformanceMonitor>>, settings: MonitorSettings) -> Self {
        Self {
            monitor,
            sources: Vec::new(),
            settings,
        }
    }

    /// Add a metric source.
    pub fn add_source(mut self, source: Arc<dyn MetricSource>) -> Self {
        info!(source = %source.name(), "Monitor: source added");
        self.sources.push(source);
        self
    }

    /// Shared handle to the monitor.
    pub fn monitor(&self) -> Arc<RwLock<PerformanceMonitor>> {
        Arc::clone(&self.monitor)
    }

    /// Collect from every source once. A failing source is logged and
    /// skipped; the others are still recorded.
    pub async fn tick(&self, stats: &mut MonitorStats) {
        let mut collected = Vec::new();
        for source in &self.sources {
            match source.collect().await {
                Ok(samples) => collected.extend(samples),
                Err(e) => {
                    stats.failed_collections += 1;
                    error!(source = %source.name(), error = %e, "Monitor: collection failed");
                }
            }
        }

        let now = Utc::now();
        let mut monitor = self.monitor.write().await;
        let raised = monitor.record_all(collected.iter().map(|(m, v)| (m.as_str(), *v)), now);
        stats.rules_fired += monitor.evaluate_rules().len() as u64;
        stats.samples += collected.len() as u64;
        stats.alerts += raised.len() as u64;
        debug!(
            samples = collected.len(),
            alerts = raised.len(),
            health = monitor.health_score(),
            "Monitor: tick complete"
        );
    }

    /// Spawn the loop. It stops when `shutdown` flips to `true`, when the
    /// sender is dropped, or after `max_ticks`.
    pub fn start(self, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<MonitorStats> {
        tokio::spawn(async move {
            let interval = Duration::from_secs(self.settings.interval_secs);
            let mut stats = MonitorStats::default();
            info!(
                interval_secs = self.settings.interval_secs,
                sources = self.sources.len(),
                "Monitor: starting"
            );

            loop {
                if *shutdown.borrow() {
                    break;
                }
                if self
                    .settings
                    .max_ticks
                    .is_some_and(|max| stats.ticks >= max)
                {
                    break;
                }

                stats.ticks += 1;
                self.tick(&mut stats).await;

                if self
                    .settings
                    .max_ticks
                    .is_some_and(|max| stats.ticks >= max)
                {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            info!(
                ticks = stats.ticks,
                samples = stats.samples,
                alerts = stats.alerts,
                "Monitor: stopped"
            );
            stats
        })
    }
}
