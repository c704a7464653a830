use crate::alert::{Alert, Severity};
use crate::analysis::{self, DegradationWarning, Trend, ANOMALY_Z_LIMIT, DEGRADATION_WATCHED};
use crate::health::{self, HealthStatus};
use crate::metrics::{threshold, MetricCategory, ThresholdStatus};
use crate::rules::{default_rules, OptimizationRule, RuleFiring};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, info, warn};

/// History length for metrics outside the catalogue.
pub const DEFAULT_HISTORY_CAPACITY: usize = 720;
/// Alerts kept in memory; the oldest are dropped first.
pub const MAX_ALERTS: usize = 1000;
/// Alerts younger than this count as active.
pub const ACTIVE_ALERT_WINDOW_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct MetricSeries {
    history: VecDeque<f64>,
    capacity: usize,
    current: f64,
    updated_at: DateTime<Utc>,
    trend: Trend,
}

impl MetricSeries {
    fn new(capacity: usize, value: f64, at: DateTime<Utc>) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
            current: value,
            updated_at: at,
            trend: Trend::Stable,
        }
    }

    fn push(&mut self, value: f64, at: DateTime<Utc>) {
        self.history.push_back(value);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.current = value;
        self.updated_at = at;
    }

    fn values(&self) -> Vec<f64> {
        self.history.iter().copied().collect()
    }
}

/// Per-metric line of a [`PerformanceSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Latest sample.
    pub value: f64,
    /// Trend over the recent history.
    pub trend: Trend,
    /// Latest sample against its threshold.
    pub threshold_status: ThresholdStatus,
    /// Catalogue group, `None` for ad-hoc metrics.
    pub category: Option<MetricCategory>,
    /// Samples held in history.
    pub samples: usize,
    /// When the latest sample arrived.
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of monitor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Weighted score in `0..=1`.
    pub system_health_score: f64,
    /// Label for the score.
    pub health_status: HealthStatus,
    /// Distinct metrics recorded.
    pub total_metrics_tracked: usize,
    /// Alerts within the active window.
    pub active_alerts: usize,
    /// Active alerts of critical severity.
    pub critical_alerts: usize,
    /// Latest state of every metric.
    pub current_metrics: BTreeMap<String, MetricSummary>,
    /// Rules whose conditions hold now.
    pub rules_fired: Vec<RuleFiring>,
    /// Predicted degradations.
    pub predictions: Vec<DegradationWarning>,
}

/// Keeps bounded metric histories and raises threshold and anomaly alerts as
/// samples arrive.
pub struct PerformanceMonitor {
    series: HashMap<String, MetricSeries>,
    alerts: VecDeque<Alert>,
    rules: Vec<OptimizationRule>,
    capacity_override: Option<usize>,
}

impl PerformanceMonitor {
    /// Monitor with the built-in optimization rules and per-category history
    /// lengths.
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            alerts: VecDeque::new(),
            rules: default_rules(),
            capacity_override: None,
        }
    }

    /// Use one history length for every metric.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.capacity_override = Some(capacity);
        self
    }

    /// Replace the optimization rules.
    pub fn with_rules(mut self, rules: Vec<OptimizationRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Samples kept for `metric`.
    pub fn history_capacity(&self, metric: &str) -> usize {
        self.capacity_override.unwrap_or_else(|| {
            MetricCategory::of(metric).map_or(DEFAULT_HISTORY_CAPACITY, MetricCategory::history_capacity)
        })
    }

    /// Record one sample and return the alerts it raised.
    pub fn record(&mut self, metric: &str, value: f64, at: DateTime<Utc>) -> Vec<Alert> {
        if !value.is_finite() {
            warn!(metric = %metric, value, "Monitor: ignoring non-finite sample");
            return Vec::new();
        }
        let capacity = self.history_capacity(metric);
        let series = self
            .series
            .entry(metric.to_string())
            .or_insert_with(|| MetricSeries::new(capacity, value, at));
        series.push(value, at);

        let values = series.values();
        series.trend = analysis::trend(&values);
        let z_score = analysis::latest_z_score(&values);

        let mut raised = Vec::new();
        if let Some(t) = threshold(metric) {
            if let Some(alert) = Alert::threshold_violation(metric, value, &t, at) {
                raised.push(alert);
            }
        }
        if let Some(z) = z_score.filter(|z| *z > ANOMALY_Z_LIMIT) {
            raised.push(Alert::anomaly(metric, value, z, at));
        }

        for alert in &raised {
            warn!(
                id = %alert.id,
                metric = %metric,
                severity = %alert.severity,
                "Monitor: {}",
                alert.message
            );
            self.push_alert(alert.clone());
        }
        debug!(metric = %metric, value, "Monitor: sample recorded");
        raised
    }

    /// Record a batch of samples taken at the same instant.
    pub fn record_all<'a, I>(&mut self, samples: I, at: DateTime<Utc>) -> Vec<Alert>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        samples
            .into_iter()
            .flat_map(|(metric, value)| self.record(metric, value, at))
            .collect()
    }

    // Alerts with the same id replace each other, so one metric raises at
    // most one alert of each kind per second.
    fn push_alert(&mut self, alert: Alert) {
        if let Some(existing) = self.alerts.iter_mut().find(|a| a.id == alert.id) {
            *existing = alert;
            return;
        }
        self.alerts.push_back(alert);
        while self.alerts.len() > MAX_ALERTS {
            self.alerts.pop_front();
        }
    }

    /// Latest sample of `metric`.
    pub fn current(&self, metric: &str) -> Option<f64> {
        self.series.get(metric).map(|s| s.current)
    }

    /// Current trend of `metric`.
    pub fn trend(&self, metric: &str) -> Option<Trend> {
        self.series.get(metric).map(|s| s.trend)
    }

    /// Held samples of `metric`, oldest first.
    pub fn history(&self, metric: &str) -> Option<Vec<f64>> {
        self.series.get(metric).map(MetricSeries::values)
    }

    /// Names of all recorded metrics, sorted.
    pub fn metrics(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Latest sample of every metric.
    pub fn current_values(&self) -> HashMap<String, f64> {
        self.series
            .iter()
            .map(|(k, s)| (k.clone(), s.current))
            .collect()
    }

    /// Current trend of every metric.
    pub fn trends(&self) -> HashMap<String, Trend> {
        self.series
            .iter()
            .map(|(k, s)| (k.clone(), s.trend))
            .collect()
    }

    /// Threshold status of the current value; metrics without a threshold
    /// are always within it. `None` when the metric was never recorded.
    pub fn threshold_status(&self, metric: &str) -> Option<ThresholdStatus> {
        let value = self.current(metric)?;
        Some(
            threshold(metric)
                .map_or(ThresholdStatus::WithinThreshold, |t| t.status(value)),
        )
    }

    /// Weighted health score; 1.0 until a health metric has been recorded.
    pub fn health_score(&self) -> f64 {
        health::health_score(&self.current_values()).unwrap_or(1.0)
    }

    /// Every retained alert, oldest first.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Alerts raised within the last hour before `now`.
    pub fn active_alerts(&self, now: DateTime<Utc>) -> Vec<&Alert> {
        let window = Duration::seconds(ACTIVE_ALERT_WINDOW_SECS);
        self.alerts
            .iter()
            .filter(|a| now.signed_duration_since(a.timestamp) < window)
            .collect()
    }

    /// Rules evaluated by [`Self::evaluate_rules`].
    pub fn rules(&self) -> &[OptimizationRule] {
        &self.rules
    }

    /// Rules whose conditions currently hold. Only recommendations are
    /// produced; nothing is executed.
    pub fn evaluate_rules(&self) -> Vec<RuleFiring> {
        let values = self.current_values();
        let trends = self.trends();
        self.rules
            .iter()
            .filter(|rule| rule.fires(&values, &trends))
            .map(|rule| {
                let firing = RuleFiring {
                    rule: rule.name.clone(),
                    priority: rule.priority,
                    conditions_met: rule.conditions_met(&values, &trends),
                    conditions_total: rule.conditions.len(),
                    recommended_actions: rule.actions.clone(),
                };
                info!(
                    rule = %firing.rule,
                    priority = %firing.priority,
                    met = firing.conditions_met,
                    total = firing.conditions_total,
                    "Monitor: optimization rule fired"
                );
                firing
            })
            .collect()
    }

    /// Declining watched metrics whose recent average nears their minimum.
    pub fn degradation_warnings(&self) -> Vec<DegradationWarning> {
        DEGRADATION_WATCHED
            .iter()
            .filter_map(|metric| {
                let series = self.series.get(*metric)?;
                if series.trend != Trend::Declining {
                    return None;
                }
                let min = threshold(metric)?.min;
                analysis::predict_degradation(metric, &series.values(), min)
            })
            .collect()
    }

    /// Snapshot of the monitor as of `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> PerformanceSummary {
        let active = self.active_alerts(now);
        let score = self.health_score();
        let current_metrics = self
            .series
            .iter()
            .map(|(name, s)| {
                let status = threshold(name)
                    .map_or(ThresholdStatus::WithinThreshold, |t| t.status(s.current));
                (
                    name.clone(),
                    MetricSummary {
                        value: s.current,
                        trend: s.trend,
                        threshold_status: status,
                        category: MetricCategory::of(name),
                        samples: s.history.len(),
                        updated_at: s.updated_at,
                    },
                )
            })
            .collect();

        PerformanceSummary {
            generated_at: now,
            system_health_score: score,
            health_status: HealthStatus::from_score(score),
            total_metrics_tracked: self.series.len(),
            active_alerts: active.len(),
            critical_alerts: active
                .iter()
                .filter(|a| a.severity == Severity::Critical)
                .count(),
            current_metrics,
            rules_fired: self.evaluate_rules(),
            predictions: self.degradation_warnings(),
        }
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
