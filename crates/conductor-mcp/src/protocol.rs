//! Request and response shapes of the tool server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// One request line. `jsonrpc` and `id` are accepted but not required.
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    /// Echoed by clients that speak JSON-RPC; unused here.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name, e.g. `tools/call`.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Registered tool name.
    pub name: String,
    /// Tool arguments; `{}` when absent.
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Tool definition as listed by `tools/list`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolDef {
    /// Unique tool name.
    pub name: String,
    /// Human-readable summary.
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the arguments.
    #[serde(default = "default_input_schema", rename = "inputSchema")]
    pub input_schema: Value,
}

fn default_input_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl ToolDef {
    /// Definition with the given schema.
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolCallResult {
    /// Result blocks; the server always sends one text block.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Set when the call failed; omitted from the wire when false.
    #[serde(default, rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Successful result with one text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    /// Failed result with one text block.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: true,
        }
    }

    /// Text of the first block, or `""`.
    pub fn first_text(&self) -> &str {
        self.content.first().map_or("", |c| c.text.as_str())
    }
}

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContentBlock {
    /// Always `text` for this server.
    #[serde(rename = "type")]
    pub content_type: String,
    /// Block contents.
    #[serde(default)]
    pub text: String,
}

impl ContentBlock {
    /// A `text` block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Name and version reported by `initialize`.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Crate version.
    pub version: String,
}

/// Result of `initialize`.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeResult {
    /// See [`PROTOCOL_VERSION`].
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Advertised capabilities: tools only.
    pub capabilities: Value,
    /// Who is answering.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Error response body: `{"error": "<message>"}`.
pub fn error_response(message: impl Into<String>) -> Value {
    serde_json::json!({ "error": message.into() })
}
