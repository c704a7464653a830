//! Line-delimited JSON tool server for Conductor.
//!
//! Each input line is one request naming a `method`; each request gets one
//! response line. `tools/call` dispatches by tool name to the memory store,
//! the orchestrator or the server's own usage counters.
//!
//! # Main types
//!
//! - [`McpServer`]: Method dispatch and the stdio read/write loop.
//! - [`Tool`] / [`ToolRegistry`]: Callable tools in registration order.
//! - [`UsageTracker`]: Per-tool call counters and a bounded call log.

/// Request and response types.
pub mod protocol;
/// Dispatch and the serve loop.
pub mod server;
/// Tool trait and registry.
pub mod tool;
/// Built-in tools.
pub mod tools;
/// Tool usage accounting.
pub mod usage;

pub use protocol::{
    ContentBlock, InitializeResult, McpRequest, ServerInfo, ToolCallParams, ToolCallResult,
    ToolDef, PROTOCOL_VERSION,
};
pub use server::{McpServer, ServeStats};
pub use tool::{parse_args, Tool, ToolRegistry};
pub use tools::{
    memory_tools, MemoryTool, OrchestrateTool, OrchestratorStatusTool, SharedOrchestrator,
    UsageStatsTool,
};
pub use usage::{CallLogEntry, ToolMetrics, UsageStats, UsageTracker};
