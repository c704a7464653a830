use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of most recent samples the trend is fitted over.
pub const TREND_WINDOW: usize = 10;
/// Minimum samples before anomaly detection runs.
pub const ANOMALY_MIN_SAMPLES: usize = 20;
/// Z-score above which the latest sample is an anomaly.
pub const ANOMALY_Z_LIMIT: f64 = 2.5;

const TREND_SLOPE_LIMIT: f64 = 0.01;

/// Direction of a metric over recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Slope above the limit.
    Improving,
    /// Slope within the limit, or too few samples.
    #[default]
    Stable,
    /// Slope below the negative limit.
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        };
        f.write_str(s)
    }
}

/// Least-squares slope of `values` against their index.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    num / den
}

/// Classify the slope of the last [`TREND_WINDOW`] values.
pub fn trend(values: &[f64]) -> Trend {
    let window = &values[values.len().saturating_sub(TREND_WINDOW)..];
    if window.len() < 3 {
        return Trend::Stable;
    }
    let s = slope(window);
    if s > TREND_SLOPE_LIMIT {
        Trend::Improving
    } else if s < -TREND_SLOPE_LIMIT {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Absolute z-score of the last value against all earlier ones.
///
/// `None` with fewer than [`ANOMALY_MIN_SAMPLES`] values or when the earlier
/// values have no spread.
pub fn latest_z_score(values: &[f64]) -> Option<f64> {
    if values.len() < ANOMALY_MIN_SAMPLES {
        return None;
    }
    let (latest, earlier) = values.split_last()?;
    let std = sample_std_dev(earlier);
    if std <= 0.0 {
        return None;
    }
    Some(((latest - mean(earlier)) / std).abs())
}

/// Remedy tried ahead of time for a metric drifting toward its minimum.
pub fn proactive_action(metric: &str) -> Option<&'static str> {
    match metric {
        "success_rate" => Some("optimize_algorithms"),
        "efficiency_score" => Some("redistribute_tasks"),
        "response_time" => Some("scale_resources"),
        _ => None,
    }
}

/// A metric whose recent average sits within 20% above its minimum while
/// trending down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationWarning {
    /// Metric name.
    pub metric: String,
    /// Mean of the recent samples.
    pub recent_average: f64,
    /// Configured minimum.
    pub threshold_min: f64,
    /// Suggested action, if one is known for the metric.
    pub action: Option<String>,
}

/// Metrics checked for predicted degradation.
pub const DEGRADATION_WATCHED: [&str; 2] = ["success_rate", "efficiency_score"];

/// Warn when the last five values average below `1.2 * min`.
pub fn predict_degradation(metric: &str, values: &[f64], min: f64) -> Option<DegradationWarning> {
    if min <= 0.0 || values.is_empty() {
        return None;
    }
    let recent = &values[values.len().saturating_sub(5)..];
    let avg = mean(recent);
    (avg < min * 1.2).then(|| DegradationWarning {
        metric: metric.to_string(),
        recent_average: avg,
        threshold_min: min,
        action: proactive_action(metric).map(str::to_string),
    })
}
