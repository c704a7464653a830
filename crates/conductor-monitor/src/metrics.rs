use serde::{Deserialize, Serialize};
use std::fmt;

/// Group a metric is collected in. Each group has its own collection
/// interval and retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// Per-agent task and efficiency figures.
    Agent,
    /// Host and service resource figures.
    System,
    /// Messaging and coordination figures.
    Communication,
}

impl MetricCategory {
    /// Every category.
    pub const ALL: [MetricCategory; 3] = [Self::Agent, Self::System, Self::Communication];

    /// Seconds between two samples of this group.
    pub fn interval_secs(self) -> u64 {
        match self {
            Self::Agent => 10,
            Self::System => 5,
            Self::Communication => 15,
        }
    }

    /// Seconds of history kept for each metric in this group.
    pub fn retention_secs(self) -> u64 {
        match self {
            Self::Agent => 7200,
            Self::System => 3600,
            Self::Communication => 7200,
        }
    }

    /// Number of samples kept per metric.
    pub fn history_capacity(self) -> usize {
        (self.retention_secs() / self.interval_secs()) as usize
    }

    /// Metric names collected in this group.
    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            Self::Agent => &[
                "task_completion_rate",
                "response_time",
                "success_rate",
                "efficiency_score",
                "resource_utilization",
                "error_rate",
            ],
            Self::System => &[
                "cpu_utilization",
                "memory_usage",
                "network_latency",
                "disk_io",
                "api_response_time",
                "concurrent_connections",
            ],
            Self::Communication => &[
                "message_throughput",
                "delivery_success_rate",
                "average_response_time",
                "queue_depth",
                "bandwidth_utilization",
                "coordination_efficiency",
            ],
        }
    }

    /// Category of a catalogued metric.
    pub fn of(metric: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.metrics().contains(&metric))
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Agent => "agent",
            Self::System => "system",
            Self::Communication => "communication",
        };
        f.write_str(s)
    }
}

/// Acceptable range of a metric. `max: None` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Values below this are violations.
    pub min: f64,
    /// Values above this are violations.
    pub max: Option<f64>,
}

impl Threshold {
    const fn new(min: f64, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Where `value` sits relative to the range.
    pub fn status(&self, value: f64) -> ThresholdStatus {
        if value < self.min {
            ThresholdStatus::BelowThreshold
        } else if self.max.is_some_and(|max| value > max) {
            ThresholdStatus::AboveThreshold
        } else {
            ThresholdStatus::WithinThreshold
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}", self.min, max),
            None => write!(f, "{}-unbounded", self.min),
        }
    }
}

/// Where a value sits relative to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdStatus {
    /// Under the minimum.
    BelowThreshold,
    /// Over the maximum.
    AboveThreshold,
    /// In range.
    WithinThreshold,
}

/// Static threshold table. Metrics without an entry are tracked but never
/// raise threshold alerts.
pub fn threshold(metric: &str) -> Option<Threshold> {
    let t = match metric {
        "task_completion_rate" => Threshold::new(0.85, Some(1.0)),
        "response_time" => Threshold::new(0.0, Some(5.0)),
        "success_rate" => Threshold::new(0.9, Some(1.0)),
        "efficiency_score" => Threshold::new(0.8, Some(1.0)),
        "resource_utilization" => Threshold::new(0.3, Some(0.85)),
        "error_rate" => Threshold::new(0.0, Some(0.05)),
        "cpu_utilization" => Threshold::new(0.0, Some(0.8)),
        "memory_usage" => Threshold::new(0.0, Some(0.8)),
        "network_latency" => Threshold::new(0.0, Some(200.0)),
        "api_response_time" => Threshold::new(0.0, Some(1000.0)),
        "message_throughput" => Threshold::new(50.0, None),
        "delivery_success_rate" => Threshold::new(0.95, Some(1.0)),
        "queue_depth" => Threshold::new(0.0, Some(100.0)),
        _ => return None,
    };
    Some(t)
}
