use crate::metrics::threshold;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metrics that feed the health score, with their weights.
pub const HEALTH_WEIGHTS: [(&str, f64); 6] = [
    ("task_completion_rate", 0.2),
    ("success_rate", 0.2),
    ("efficiency_score", 0.15),
    ("cpu_utilization", 0.1),
    ("memory_usage", 0.1),
    ("delivery_success_rate", 0.1),
];

/// Lower is better for these.
const UTILISATION_METRICS: [&str; 2] = ["cpu_utilization", "memory_usage"];

/// Coarse label for a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Score of at least 0.8.
    Healthy,
    /// Score of at least 0.6.
    Degraded,
    /// Anything lower.
    Critical,
}

impl HealthStatus {
    /// Label for `score`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Healthy
        } else if score >= 0.6 {
            Self::Degraded
        } else {
            Self::Critical
        }
    }
}

/// Normalised 0..=1 score of one metric value.
pub fn metric_score(metric: &str, value: f64) -> f64 {
    if UTILISATION_METRICS.contains(&metric) {
        (1.0 - value).max(0.0)
    } else {
        let max = threshold(metric).and_then(|t| t.max).unwrap_or(1.0);
        (value / max).min(1.0)
    }
}

/// Weighted average over the health metrics present in `current`.
///
/// Returns `None` when none of them has been recorded yet.
pub fn health_score(current: &HashMap<String, f64>) -> Option<f64> {
    let (total, weight) = HEALTH_WEIGHTS
        .iter()
        .filter_map(|(metric, w)| current.get(*metric).map(|v| (metric_score(metric, *v) * w, *w)))
        .fold((0.0, 0.0), |(s, tw), (score, w)| (s + score, tw + w));
    (weight > 0.0).then(|| total / weight)
}
