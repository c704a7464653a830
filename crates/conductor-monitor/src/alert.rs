use crate::metrics::Threshold;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Below the minimum but within 80% of it.
    Medium,
    /// Well below the minimum, or above the maximum.
    High,
    /// More than 20% above the maximum.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// What raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A value outside its configured range.
    ThresholdViolation,
    /// A value more than three standard deviations from its recent mean.
    Anomaly,
}

/// A raised alert. Alerts are never resolved automatically; they age out of
/// the active window instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Id such as `alert_cpu_utilization_1700000000`.
    pub id: String,
    /// What raised it.
    pub kind: AlertKind,
    /// How urgent it is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// When it was raised.
    pub timestamp: DateTime<Utc>,
    /// Metric name.
    pub metric: String,
    /// Value that raised it.
    pub value: f64,
    /// Suggested follow-ups.
    pub recommended_actions: Vec<String>,
}

/// Severity of a threshold violation, or `None` when the value is in range.
///
/// Below the minimum is `high` under 80% of it, `medium` otherwise. Above the
/// maximum is `critical` over 120% of it, `high` otherwise.
pub fn violation_severity(value: f64, threshold: &Threshold) -> Option<Severity> {
    let mut severity = None;
    if value < threshold.min {
        severity = Some(if value < threshold.min * 0.8 {
            Severity::High
        } else {
            Severity::Medium
        });
    }
    if let Some(max) = threshold.max {
        if value > max {
            severity = Some(if value > max * 1.2 {
                Severity::Critical
            } else {
                Severity::High
            });
        }
    }
    severity
}

/// Remediation hints attached to threshold alerts.
pub fn recommended_actions(metric: &str) -> Vec<String> {
    let actions: &[&str] = match metric {
        "task_completion_rate" => &["redistribute_tasks", "optimize_algorithms", "scale_resources"],
        "response_time" => &["optimize_algorithms", "scale_resources", "reduce_load"],
        "success_rate" => &[
            "review_error_logs",
            "improve_error_handling",
            "optimize_processes",
        ],
        "cpu_utilization" => &["scale_out_instances", "optimize_algorithms", "load_balancing"],
        "memory_usage" => &[
            "garbage_collection",
            "optimize_memory_usage",
            "scale_resources",
        ],
        _ => &["investigate_issue", "contact_support"],
    };
    actions.iter().map(|a| (*a).to_string()).collect()
}

const ANOMALY_ACTIONS: [&str; 3] = [
    "investigate_anomaly",
    "check_data_quality",
    "review_system_logs",
];

impl Alert {
    /// Threshold alert for `value`, if it violates `threshold`.
    pub fn threshold_violation(
        metric: &str,
        value: f64,
        threshold: &Threshold,
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        let severity = violation_severity(value, threshold)?;
        Some(Self {
            id: format!("alert_{metric}_{}", timestamp.timestamp()),
            kind: AlertKind::ThresholdViolation,
            severity,
            message: format!("{metric} is {value:.2} (threshold: {threshold})"),
            timestamp,
            metric: metric.to_string(),
            value,
            recommended_actions: recommended_actions(metric),
        })
    }

    /// Anomaly alert for a sample whose z-score already exceeded the limit.
    pub fn anomaly(metric: &str, value: f64, z_score: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: format!("anomaly_{metric}_{}", timestamp.timestamp()),
            kind: AlertKind::Anomaly,
            severity: if z_score > 3.0 {
                Severity::High
            } else {
                Severity::Medium
            },
            message: format!("Anomaly detected in {metric}: {value:.2} (Z-score: {z_score:.2})"),
            timestamp,
            metric: metric.to_string(),
            value,
            recommended_actions: ANOMALY_ACTIONS.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::metrics::threshold;

    #[test]
    fn test_below_min_severity() {
        let t = threshold("success_rate").unwrap();
        assert_eq!(violation_severity(0.85, &t), Some(Severity::Medium));
        assert_eq!(violation_severity(0.7, &t), Some(Severity::High));
        assert_eq!(violation_severity(0.95, &t), None);
    }

    #[test]
    fn test_above_max_severity() {
        let t = threshold("cpu_utilization").unwrap();
        assert_eq!(violation_severity(0.9, &t), Some(Severity::High));
        assert_eq!(violation_severity(0.97, &t), Some(Severity::Critical));
        assert_eq!(violation_severity(0.8, &t), None);
    }

    #[test]
    fn test_threshold_alert_fields() {
        let t = threshold("queue_depth").unwrap();
        let now = Utc::now();
        let alert = Alert::threshold_violation("queue_depth", 130.0, &t, now).unwrap();
        assert_eq!(alert.kind, AlertKind::ThresholdViolation);
        assert_eq!(alert.severity, Severity::Critical);
        assert_eq!(alert.message, "queue_depth is 130.00 (threshold: 0-100)");
        assert_eq!(alert.id, format!("alert_queue_depth_{}", now.timestamp()));
        assert_eq!(
            alert.recommended_actions,
            vec!["investigate_issue", "contact_support"]
        );
    }

    #[test]
    fn test_anomaly_severity() {
        let now = Utc::now();
        assert_eq!(Alert::anomaly("m", 1.0, 2.7, now).severity, Severity::Medium);
        let high = Alert::anomaly("m", 1.0, 3.4, now);
        assert_eq!(high.severity, Severity::High);
        assert_eq!(high.message, "Anomaly detected in m: 1.00 (Z-score: 3.40)");
    }
}
