use crate::protocol::ToolDef;
use crate::tool::Tool;
use crate::usage::UsageTracker;
use async_trait::async_trait;
use conductor_core::ConductorResult;
use serde_json::{json, Value};
use std::sync::Arc;

/// `usage_stats`: call counts and timings of the server's own tools.
pub struct UsageStatsTool {
    definition: ToolDef,
    tracker: Arc<UsageTracker>,
}

impl UsageStatsTool {
    /// Tool reporting on `tracker`.
    pub fn new(tracker: Arc<UsageTracker>) -> Self {
        Self {
            definition: ToolDef::new(
                "usage_stats",
                "Tool call counts, success rate and average execution time",
                json!({"type": "object", "properties": {}}),
            ),
            tracker,
        }
    }
}

#[async_trait]
impl Tool for UsageStatsTool {
    fn definition(&self) -> &ToolDef {
        &self.definition
    }

    async fn call(&self, _arguments: Value) -> ConductorResult<Value> {
        Ok(serde_json::to_value(self.tracker.stats().await)?)
    }
}
