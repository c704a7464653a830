use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One served tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLogEntry {
    /// Tool name.
    pub tool: String,
    /// When the call finished.
    pub timestamp: DateTime<Utc>,
    /// Wall time of the call.
    pub duration_ms: u64,
    /// Whether the tool returned `Ok`.
    pub success: bool,
    /// Error text of a failed call.
    pub error: Option<String>,
}

/// Counters for one tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetrics {
    /// All calls.
    pub total_calls: u64,
    /// Calls that returned `Ok`.
    pub successful_calls: u64,
    /// Calls that returned an error.
    pub failed_calls: u64,
    /// Summed wall time of all calls.
    pub total_duration_ms: u64,
}

/// Aggregate answer of the `usage_stats` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Calls across all tools.
    pub total_tool_calls: u64,
    /// Successful calls across all tools.
    pub successful_calls: u64,
    /// Percentage, 0 with no calls.
    pub success_rate: f64,
    /// Mean duration of successful calls.
    pub average_execution_ms: f64,
    /// Tools by call count, most used first.
    pub most_popular_tools: Vec<(String, u64)>,
    /// When the stats were computed.
    pub last_updated: DateTime<Utc>,
}

/// Per-tool call counters plus a bounded call log.
pub struct UsageTracker {
    log: RwLock<Vec<CallLogEntry>>,
    metrics: RwLock<HashMap<String, ToolMetrics>>,
    successful_duration_ms: RwLock<u64>,
    max_log_entries: usize,
}

impl UsageTracker {
    /// Tracker keeping the last 10 000 calls.
    pub fn new() -> Self {
        Self::with_log_limit(10_000)
    }

    /// Tracker keeping the last `max_log_entries` calls.
    pub fn with_log_limit(max_log_entries: usize) -> Self {
        Self {
            log: RwLock::new(Vec::new()),
            metrics: RwLock::new(HashMap::new()),
            successful_duration_ms: RwLock::new(0),
            max_log_entries,
        }
    }

    /// Log one call and update its tool's counters. `error` is `None` on success.
    pub async fn record(&self, tool: &str, duration_ms: u64, error: Option<String>) {
        let success = error.is_none();
        {
            let mut log = self.log.write().await;
            log.push(CallLogEntry {
                tool: tool.to_string(),
                timestamp: Utc::now(),
                duration_ms,
                success,
                error,
            });
            if log.len() > self.max_log_entries {
                let excess = log.len() - self.max_log_entries;
                log.drain(..excess);
            }
        }

        let mut metrics = self.metrics.write().await;
        let m = metrics.entry(tool.to_string()).or_default();
        m.total_calls += 1;
        m.total_duration_ms += duration_ms;
        if success {
            m.successful_calls += 1;
            *self.successful_duration_ms.write().await += duration_ms;
        } else {
            m.failed_calls += 1;
        }
    }

    /// Most recent entries first.
    pub async fn recent(&self, limit: usize) -> Vec<CallLogEntry> {
        let log = self.log.read().await;
        log.iter().rev().take(limit).cloned().collect()
    }

    /// Counters of one tool; zeros if it was never called.
    pub async fn tool_metrics(&self, tool: &str) -> ToolMetrics {
        self.metrics.read().await.get(tool).cloned().unwrap_or_default()
    }

    /// Calls across all tools.
    pub async fn total_calls(&self) -> u64 {
        self.metrics.read().await.values().map(|m| m.total_calls).sum()
    }

    /// Aggregate view for the `usage_stats` tool.
    pub async fn stats(&self) -> UsageStats {
        let metrics = self.metrics.read().await;
        let total: u64 = metrics.values().map(|m| m.total_calls).sum();
        let successful: u64 = metrics.values().map(|m| m.successful_calls).sum();
        let successful_ms = *self.successful_duration_ms.read().await;

        let mut popular: Vec<(String, u64)> = metrics
            .iter()
            .map(|(name, m)| (name.clone(), m.total_calls))
            .collect();
        popular.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        UsageStats {
            total_tool_calls: total,
            successful_calls: successful,
            success_rate: if total > 0 {
                successful as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            average_execution_ms: if successful > 0 {
                successful_ms as f64 / successful as f64
            } else {
                0.0
            },
            most_popular_tools: popular,
            last_updated: Utc::now(),
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}
