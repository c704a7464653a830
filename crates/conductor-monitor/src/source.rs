use async_trait::async_trait;
use conductor_core::ConductorResult;
use conductor_orchestrator::{ScoredOrchestrator, ScoredTaskStatus};
use std::sync::Arc;
use sysinfo::{Disks, System};
use tokio::sync::{Mutex, RwLock};

/// One collected value.
pub type Sample = (String, f64);

/// Something that can be sampled for metrics on every monitor tick.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Source name used in logs.
    fn name(&self) -> &str;

    /// Take one sample of every metric this source provides.
    async fn collect(&self) -> ConductorResult<Vec<Sample>>;
}

fn sample(metric: &str, value: f64) -> Sample {
    (metric.to_string(), value)
}

/// Host CPU, memory and disk usage, as fractions in `0..=1`.
pub struct SystemSource {
    system: Mutex<System>,
}

impl SystemSource {
    /// Source with the CPU counters primed.
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is a delta between two refreshes; prime the first one.
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for SystemSource {
    fn name(&self) -> &str {
        "system"
    }

    async fn collect(&self) -> ConductorResult<Vec<Sample>> {
        let mut samples = Vec::with_capacity(3);
        {
            let mut sys = self.system.lock().await;
            sys.refresh_cpu_usage();
            sys.refresh_memory();
            samples.push(sample(
                "cpu_utilization",
                f64::from(sys.global_cpu_usage()) / 100.0,
            ));
            let total = sys.total_memory();
            if total > 0 {
                samples.push(sample(
                    "memory_usage",
                    sys.used_memory() as f64 / total as f64,
                ));
            }
        }

        let disks = Disks::new_with_refreshed_list();
        let (total, available) = disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(t, a), d| (t + d.total_space(), a + d.available_space()));
        if total > 0 {
            samples.push(sample(
                "disk_usage",
                total.saturating_sub(available) as f64 / total as f64,
            ));
        }
        Ok(samples)
    }
}

/// Load and outcome figures read from a shared scored orchestrator.
pub struct OrchestratorSource {
    state: Arc<RwLock<ScoredOrchestrator>>,
}

impl OrchestratorSource {
    /// Source reading `state`.
    pub fn new(state: Arc<RwLock<ScoredOrchestrator>>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl MetricSource for OrchestratorSource {
    fn name(&self) -> &str {
        "orchestrator"
    }

    async fn collect(&self) -> ConductorResult<Vec<Sample>> {
        let orch = self.state.read().await;
        let mut samples = vec![
            sample("resource_utilization", orch.system_load()),
            sample("queue_depth", orch.queue().len() as f64),
        ];

        // Queued tasks are pending; dispatched ones live in `tasks`.
        let tasks = orch.tasks();
        let queued = orch.queue().len();
        if queued + tasks.len() > 0 {
            samples.push(sample(
                "pending_ratio",
                queued as f64 / (queued + tasks.len()) as f64,
            ));
        }

        let completed = tasks
            .iter()
            .filter(|t| t.status == ScoredTaskStatus::Completed)
            .count();
        let failed = tasks
            .iter()
            .filter(|t| t.status == ScoredTaskStatus::Failed)
            .count();
        if completed + failed > 0 {
            samples.push(sample(
                "task_completion_rate",
                completed as f64 / (completed + failed) as f64,
            ));
        }

        let agents = orch.agents();
        if !agents.is_empty() {
            let n = agents.len() as f64;
            samples.push(sample(
                "success_rate",
                agents.iter().map(|a| a.performance.success_rate).sum::<f64>() / n,
            ));
            samples.push(sample(
                "efficiency_score",
                agents
                    .iter()
                    .map(|a| a.performance.efficiency_score)
                    .sum::<f64>()
                    / n,
            ));
        }
        Ok(samples)
    }
}

/// Uniform random draws over fixed per-metric ranges, for demonstrations.
#[cfg(feature = "demo")]
pub struct SimulatedSource {
    categories: Vec<crate::metrics::MetricCategory>,
}

#[cfg(feature = "demo")]
impl SimulatedSource {
    /// Source drawing every metric of `categories`.
    pub fn new(categories: Vec<crate::metrics::MetricCategory>) -> Self {
        Self { categories }
    }

    /// Every catalogued metric.
    pub fn all() -> Self {
        Self::new(crate::metrics::MetricCategory::ALL.to_vec())
    }

    fn range(metric: &str) -> Option<(f64, f64)> {
        let r = match metric {
            "task_completion_rate" => (0.75, 0.98),
            "response_time" => (0.5, 8.0),
            "success_rate" => (0.85, 0.99),
            "efficiency_score" => (0.65, 0.95),
            "resource_utilization" => (0.2, 0.9),
            "error_rate" => (0.0, 0.08),
            "cpu_utilization" => (0.2, 0.95),
            "memory_usage" => (0.3, 0.9),
            "network_latency" => (10.0, 250.0),
            "disk_io" => (5.0, 95.0),
            "api_response_time" => (50.0, 1500.0),
            "concurrent_connections" => (10.0, 200.0),
            "message_throughput" => (20.0, 180.0),
            "delivery_success_rate" => (0.88, 0.99),
            "average_response_time" => (1.0, 15.0),
            "queue_depth" => (0.0, 180.0),
            "bandwidth_utilization" => (0.1, 0.9),
            "coordination_efficiency" => (0.7, 0.98),
            _ => return None,
        };
        Some(r)
    }

    fn draw(&self) -> Vec<Sample> {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        self.categories
            .iter()
            .flat_map(|c| c.metrics().iter())
            .filter_map(|m| Self::range(m).map(|(lo, hi)| sample(m, rng.gen_range(lo..hi))))
            .collect()
    }
}

#[cfg(feature = "demo")]
#[async_trait]
impl MetricSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn collect(&self) -> ConductorResult<Vec<Sample>> {
        Ok(self.draw())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use conductor_orchestrator::{ScoredAgent, ScoredAgentStatus, ScoredPriority};

    fn value(samples: &[Sample], metric: &str) -> Option<f64> {
        samples.iter().find(|(m, _)| m == metric).map(|(_, v)| *v)
    }

    #[tokio::test]
    async fn test_system_source_fractions() {
        let samples = SystemSource::new().collect().await.unwrap();
        for (metric, v) in &samples {
            assert!((0.0..=1.0).contains(v), "{metric} = {v}");
        }
        assert!(value(&samples, "cpu_utilization").is_some());
    }

    #[tokio::test]
    async fn test_orchestrator_source_empty() {
        let state = Arc::new(RwLock::new(ScoredOrchestrator::default()));
        let samples = OrchestratorSource::new(state).collect().await.unwrap();
        assert_eq!(value(&samples, "queue_depth"), Some(0.0));
        assert!(value(&samples, "pending_ratio").is_none());
        assert!(value(&samples, "success_rate").is_none());
    }

    #[tokio::test]
    async fn test_orchestrator_source_counts() {
        let mut orch = ScoredOrchestrator::new(2);
        orch.register_agent(ScoredAgent::new("A", "r", &["x"], &[]))
            .unwrap();
        let done = orch.create_task("t1", ScoredPriority::High, vec!["x".into()]);
        orch.distribute();
        orch.complete_scored_task(done, true).unwrap();
        orch.set_agent_status("A", ScoredAgentStatus::Maintenance)
            .unwrap();
        orch.create_task("t2", ScoredPriority::High, vec!["x".into()]);
        orch.distribute();

        let state = Arc::new(RwLock::new(orch));
        let samples = OrchestratorSource::new(state).collect().await.unwrap();
        assert_eq!(value(&samples, "queue_depth"), Some(1.0));
        assert_eq!(value(&samples, "pending_ratio"), Some(0.5));
        assert_eq!(value(&samples, "task_completion_rate"), Some(1.0));
        assert_eq!(value(&samples, "resource_utilization"), Some(0.0));
    }

    #[cfg(feature = "demo")]
    #[tokio::test]
    async fn test_simulated_ranges() {
        let samples = SimulatedSource::all().collect().await.unwrap();
        assert_eq!(samples.len(), 18);
        let latency = value(&samples, "network_latency").unwrap();
        assert!((10.0..250.0).contains(&latency));
    }
}
