//! Built-in tools.

mod memory;
mod orchestration;
mod usage;

pub use memory::{memory_tools, MemoryTool};
pub use orchestration::{OrchestrateTool, OrchestratorStatusTool, SharedOrchestrator};
pub use usage::UsageStatsTool;
