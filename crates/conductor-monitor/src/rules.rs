use crate::alert::Severity;
use crate::analysis::Trend;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Comparison used by a metric condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Strictly less than.
    Lt,
    /// Strictly greater than.
    Gt,
    /// Equal within `f64::EPSILON`.
    Eq,
}

impl Operator {
    /// Whether `value <op> target`.
    pub fn holds(self, value: f64, target: f64) -> bool {
        match self {
            Self::Lt => value < target,
            Self::Gt => value > target,
            Self::Eq => (value - target).abs() < f64::EPSILON,
        }
    }
}

/// One clause of an optimization rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Current value of `metric` compared with `value`.
    Metric {
        /// Metric name.
        metric: String,
        /// Comparison applied.
        operator: Operator,
        /// Right-hand side of the comparison.
        value: f64,
    },
    /// Current trend of `metric` equals `trend`.
    Trend {
        /// Metric name.
        metric: String,
        /// Trend that satisfies the condition.
        trend: Trend,
    },
}

impl Condition {
    fn metric(metric: &str, operator: Operator, value: f64) -> Self {
        Self::Metric {
            metric: metric.to_string(),
            operator,
            value,
        }
    }

    /// A condition over a metric that has not been recorded never holds.
    pub fn holds(&self, values: &HashMap<String, f64>, trends: &HashMap<String, Trend>) -> bool {
        match self {
            Self::Metric {
                metric,
                operator,
                value,
            } => values.get(metric).is_some_and(|v| operator.holds(*v, *value)),
            Self::Trend { metric, trend } => trends.get(metric) == Some(trend),
        }
    }
}

/// Named set of conditions and the actions recommended when enough of them
/// hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRule {
    /// Rule name.
    pub name: String,
    /// Conditions, half of which must hold.
    pub conditions: Vec<Condition>,
    /// Actions recommended when the rule fires.
    pub actions: Vec<String>,
    /// Urgency of the recommendation.
    pub priority: Severity,
}

impl OptimizationRule {
    /// Number of conditions that currently hold.
    pub fn conditions_met(
        &self,
        values: &HashMap<String, f64>,
        trends: &HashMap<String, Trend>,
    ) -> usize {
        self.conditions
            .iter()
            .filter(|c| c.holds(values, trends))
            .count()
    }

    /// Fires when at least half of the conditions hold.
    pub fn fires(&self, values: &HashMap<String, f64>, trends: &HashMap<String, Trend>) -> bool {
        !self.conditions.is_empty()
            && self.conditions_met(values, trends) as f64 >= self.conditions.len() as f64 * 0.5
    }
}

/// A rule that fired during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFiring {
    /// Rule name.
    pub rule: String,
    /// Rule priority.
    pub priority: Severity,
    /// Conditions that held.
    pub conditions_met: usize,
    /// Conditions in the rule.
    pub conditions_total: usize,
    /// The rule's actions.
    pub recommended_actions: Vec<String>,
}

fn actions(list: &[&str]) -> Vec<String> {
    list.iter().map(|a| (*a).to_string()).collect()
}

/// The built-in rule set.
pub fn default_rules() -> Vec<OptimizationRule> {
    vec![
        OptimizationRule {
            name: "performance_degradation".into(),
            conditions: vec![
                Condition::metric("efficiency_score", Operator::Lt, 0.7),
                Condition::metric("success_rate", Operator::Lt, 0.85),
                Condition::Trend {
                    metric: "efficiency_score".into(),
                    trend: Trend::Declining,
                },
            ],
            actions: actions(&[
                "redistribute_tasks",
                "scale_resources",
                "optimize_algorithms",
                "alert_administrators",
            ]),
            priority: Severity::High,
        },
        OptimizationRule {
            name: "system_overload".into(),
            conditions: vec![
                Condition::metric("cpu_utilization", Operator::Gt, 0.9),
                Condition::metric("memory_usage", Operator::Gt, 0.85),
                Condition::metric("queue_depth", Operator::Gt, 150.0),
            ],
            actions: actions(&[
                "scale_out_instances",
                "enable_load_balancing",
                "throttle_incoming_requests",
                "emergency_resource_allocation",
            ]),
            priority: Severity::Critical,
        },
        OptimizationRule {
            name: "communication_bottleneck".into(),
            conditions: vec![
                Condition::metric("message_throughput", Operator::Lt, 30.0),
                Condition::metric("average_response_time", Operator::Gt, 10.0),
                Condition::metric("delivery_success_rate", Operator::Lt, 0.9),
            ],
            actions: actions(&[
                "optimize_message_routing",
                "increase_communication_bandwidth",
                "implement_message_prioritization",
                "restart_communication_services",
            ]),
            priority: Severity::High,
        },
    ]
}
