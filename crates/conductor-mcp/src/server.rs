use crate::protocol::{
    error_response, InitializeResult, McpRequest, ServerInfo, ToolCallParams, ToolCallResult,
    PROTOCOL_VERSION,
};
use crate::tool::ToolRegistry;
use crate::tools::{
    memory_tools, OrchestrateTool, OrchestratorStatusTool, SharedOrchestrator, UsageStatsTool,
};
use crate::usage::UsageTracker;
use conductor_core::ConductorResult;
use conductor_memory::MemoryStore;
use conductor_orchestrator::TaskExecutor;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Counters returned by [`McpServer::serve`] at end of input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    /// Responses written, parse errors included.
    pub requests: u64,
    /// Lines that were not valid requests.
    pub parse_errors: u64,
}

/// Dispatches request lines to the registered tools.
pub struct McpServer {
    registry: ToolRegistry,
    usage: Arc<UsageTracker>,
    info: ServerInfo,
}

impl McpServer {
    /// Server over an existing registry and tracker.
    pub fn new(registry: ToolRegistry, usage: Arc<UsageTracker>) -> Self {
        Self {
            registry,
            usage,
            info: ServerInfo {
                name: "conductor".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Server with the memory, orchestration and usage tools registered.
    pub fn with_default_tools(
        store: Arc<dyn MemoryStore>,
        orchestrator: SharedOrchestrator,
        executor: Option<Arc<dyn TaskExecutor>>,
    ) -> Self {
        let usage = Arc::new(UsageTracker::new());
        let mut registry = ToolRegistry::new();
        for tool in memory_tools(store) {
            registry.register(tool);
        }
        registry.register(Arc::new(OrchestrateTool::new(
            Arc::clone(&orchestrator),
            executor,
        )));
        registry.register(Arc::new(OrchestratorStatusTool::new(orchestrator)));
        registry.register(Arc::new(UsageStatsTool::new(Arc::clone(&usage))));
        Self::new(registry, usage)
    }

    /// Registered tools.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Tracker shared with the `usage_stats` tool.
    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    /// Handle one decoded request.
    pub async fn handle_request(&self, request: McpRequest) -> Value {
        debug!(method = %request.method, "Request");
        match request.method.as_str() {
            "initialize" => to_json(InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: json!({"tools": {}}),
                server_info: self.info.clone(),
            }),
            "tools/list" => json!({ "tools": self.registry.definitions() }),
            "tools/call" => {
                let params = request.params.unwrap_or(Value::Null);
                match serde_json::from_value::<ToolCallParams>(params) {
                    Ok(params) => to_json(self.call_tool(params).await),
                    Err(e) => error_response(format!("Invalid tools/call params: {e}")),
                }
            }
            "ping" => json!({}),
            other => {
                warn!(method = %other, "Unknown method");
                error_response(format!("Unknown method: {other}"))
            }
        }
    }

    async fn call_tool(&self, params: ToolCallParams) -> ToolCallResult {
        let Some(tool) = self.registry.get(&params.name) else {
            warn!(tool = %params.name, "Unknown tool");
            return ToolCallResult::error(format!("Unknown tool: {}", params.name));
        };

        let started = Instant::now();
        let result = tool.call(params.arguments).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(value) => {
                self.usage.record(&params.name, duration_ms, None).await;
                info!(tool = %params.name, duration_ms, "Tool call succeeded");
                ToolCallResult::text(render(value))
            }
            Err(e) => {
                self.usage
                    .record(&params.name, duration_ms, Some(e.to_string()))
                    .await;
                error!(tool = %params.name, error = %e, "Tool call failed");
                ToolCallResult::error(format!("Tool execution error: {e}"))
            }
        }
    }

    /// Handle one raw input line. Blank lines produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        Some(match parse_line(line)? {
            Ok(request) => self.handle_request(request).await,
            Err(e) => error_response(e.to_string()),
        })
    }

    /// Read requests from `reader` until end of input, writing one response
    /// line per request to `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> ConductorResult<ServeStats>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(tools = self.registry.len(), "Tool server listening on stdio");
        let mut stats = ServeStats::default();
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let response = match parse_line(&line) {
                None => continue,
                Some(Ok(request)) => self.handle_request(request).await,
                Some(Err(e)) => {
                    stats.parse_errors += 1;
                    error_response(e.to_string())
                }
            };
            stats.requests += 1;
            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
        info!(requests = stats.requests, "Input closed, tool server stopping");
        Ok(stats)
    }
}

fn parse_line(line: &str) -> Option<Result<McpRequest, serde_json::Error>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = serde_json::from_str::<McpRequest>(trimmed);
    if let Err(e) = &parsed {
        warn!(error = %e, "Malformed request line");
    }
    Some(parsed)
}

/// Strings are returned as they are, anything else as pretty JSON.
fn render(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

fn to_json<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| error_response(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_string_and_json() {
        assert_eq!(render(json!("done")), "done");
        assert_eq!(render(json!({"a": 1})), "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn test_blank_line_ignored() {
        let server = McpServer::new(ToolRegistry::new(), Arc::new(UsageTracker::new()));
        assert!(server.handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = McpServer::new(ToolRegistry::new(), Arc::new(UsageTracker::new()));
        let out = server
            .handle_line(r#"{"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(out, json!({"error": "Unknown method: resources/list"}));
    }
}
