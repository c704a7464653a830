//! Performance monitoring for Conductor.
//!
//! Samples from [`MetricSource`]s are recorded into a [`PerformanceMonitor`],
//! which keeps a bounded history per metric, checks every sample against a
//! static threshold table, classifies trends and flags statistical outliers.
//! Optimization rules turn the current picture into recommended actions.
//!
//! # Main types
//!
//! - [`PerformanceMonitor`]: Histories, alerts, health score and summaries.
//! - [`MonitorRunner`]: Tokio loop that samples sources on an interval.
//! - [`SystemSource`] / [`OrchestratorSource`]: Host and orchestrator metrics.
//! - [`OptimizationRule`]: Conditions over metrics and trends.
//!
//! The random `SimulatedSource` exists only with the `demo` feature.

/// Alerts, severities and recommended actions.
pub mod alert;
/// Trend, z-score and degradation analysis.
pub mod analysis;
/// Weighted health score.
pub mod health;
/// Metric catalogue and thresholds.
pub mod metrics;
/// The monitor itself.
pub mod monitor;
/// Optimization rules.
pub mod rules;
/// Collection loop.
pub mod runner;
/// Metric sources.
pub mod source;

pub use alert::{recommended_actions, violation_severity, Alert, AlertKind, Severity};
pub use analysis::{latest_z_score, slope, trend, DegradationWarning, Trend};
pub use health::{health_score, HealthStatus};
pub use metrics::{threshold, MetricCategory, Threshold, ThresholdStatus};
pub use monitor::{MetricSummary, PerformanceMonitor, PerformanceSummary};
pub use rules::{default_rules, Condition, Operator, OptimizationRule, RuleFiring};
pub use runner::{MonitorRunner, MonitorSettings, MonitorStats};
#[cfg(feature = "demo")]
pub use source::SimulatedSource;
pub use source::{MetricSource, OrchestratorSource, Sample, SystemSource};
