use crate::protocol::ToolDef;
use async_trait::async_trait;
use conductor_core::{ConductorError, ConductorResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A callable tool. The returned value is rendered as text: strings as they
/// are, everything else as pretty-printed JSON.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and argument schema.
    fn definition(&self) -> &ToolDef;

    /// Run the tool. Strings are sent to the client verbatim, other values as pretty JSON.
    async fn call(&self, arguments: Value) -> ConductorResult<Value>;
}

/// Decode tool arguments into `T`, naming the tool on failure.
pub fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> ConductorResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| ConductorError::Mcp(format!("Invalid arguments for {tool}: {e}")))
}

/// Tools by name, listed in registration order.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Add a tool; a tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name.clone();
        info!(tool = %name, "Registered tool");
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// The tool registered as `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<&ToolDef> {
        self.order
            .iter()
            .filter_map(|n| self.tools.get(n))
            .map(|t| t.definition())
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
