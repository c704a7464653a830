use crate::protocol::ToolDef;
use crate::tool::{parse_args, Tool};
use async_trait::async_trait;
use conductor_core::ConductorResult;
use conductor_memory::{MemoryStore, NewMemory, DEFAULT_CATEGORY, KNOWN_CATEGORIES};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemoryOp {
    Store,
    Retrieve,
    List,
    Delete,
    Stats,
    Cleanup,
    SessionCreate,
}

#[derive(Deserialize)]
struct StoreArgs {
    key: String,
    value: Value,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    expires_hours: Option<u64>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Deserialize)]
struct RetrieveArgs {
    key: String,
    #[serde(default)]
    default: Value,
}

#[derive(Deserialize)]
struct KeyArgs {
    key: String,
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
struct SessionArgs {
    session_id: String,
    #[serde(default)]
    context_data: Option<Value>,
}

/// One of the memory tools, backed by a shared store.
pub struct MemoryTool {
    definition: ToolDef,
    op: MemoryOp,
    store: Arc<dyn MemoryStore>,
}

impl MemoryTool {
    fn new(op: MemoryOp, store: Arc<dyn MemoryStore>) -> Self {
        Self {
            definition: definition(op),
            op,
            store,
        }
    }
}

fn category_schema() -> Value {
    json!({
        "type": "string",
        "examples": KNOWN_CATEGORIES,
        "default": DEFAULT_CATEGORY,
        "description": "Memory category for organization"
    })
}

fn definition(op: MemoryOp) -> ToolDef {
    match op {
        MemoryOp::Store => ToolDef::new(
            "memory_store",
            "Store a value that persists across sessions",
            json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string", "description": "Memory key"},
                    "value": {"description": "Value to store (any JSON)"},
                    "category": category_schema(),
                    "expires_hours": {"type": "integer", "description": "Hours until expiry"},
                    "session_id": {"type": "string", "description": "Owning session"},
                    "metadata": {"type": "object", "description": "Extra metadata"}
                },
                "required": ["key", "value"]
            }),
        ),
        MemoryOp::Retrieve => ToolDef::new(
            "memory_retrieve",
            "Retrieve a stored value",
            json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string", "description": "Memory key"},
                    "default": {"description": "Returned when the key is absent or expired"}
                },
                "required": ["key"]
            }),
        ),
        MemoryOp::List => ToolDef::new(
            "memory_list",
            "List the entries of a category",
            json!({
                "type": "object",
                "properties": {"category": category_schema()}
            }),
        ),
        MemoryOp::Delete => ToolDef::new(
            "memory_delete",
            "Delete a stored value",
            json!({
                "type": "object",
                "properties": {"key": {"type": "string", "description": "Memory key"}},
                "required": ["key"]
            }),
        ),
        MemoryOp::Stats => ToolDef::new(
            "memory_stats",
            "Storage statistics",
            json!({"type": "object", "properties": {}}),
        ),
        MemoryOp::Cleanup => ToolDef::new(
            "memory_cleanup",
            "Remove expired entries",
            json!({"type": "object", "properties": {}}),
        ),
        MemoryOp::SessionCreate => ToolDef::new(
            "session_create",
            "Create or refresh a tracked session",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {"type": "string", "description": "Session identifier"},
                    "context_data": {"type": "object", "description": "Session context"}
                },
                "required": ["session_id"]
            }),
        ),
    }
}

#[async_trait]
impl Tool for MemoryTool {
    fn definition(&self) -> &ToolDef {
        &self.definition
    }

    async fn call(&self, arguments: Value) -> ConductorResult<Value> {
        let name = self.definition.name.as_str();
        match self.op {
            MemoryOp::Store => {
                let args: StoreArgs = parse_args(name, arguments)?;
                let mut memory = NewMemory::new(&args.key, args.value)
                    .category(args.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()))
                    .expires_in_hours(args.expires_hours.unwrap_or(0))?;
                if let Some(session) = args.session_id {
                    memory = memory.session(session);
                }
                if let Some(metadata) = args.metadata {
                    memory = memory.metadata(metadata);
                }
                self.store.store(memory).await?;
                Ok(Value::String(format!("Memory stored successfully: {}", args.key)))
            }
            MemoryOp::Retrieve => {
                let args: RetrieveArgs = parse_args(name, arguments)?;
                let entry = self.store.retrieve(&args.key).await?;
                let found = entry.is_some();
                Ok(json!({
                    "key": args.key,
                    "value": entry.map_or(args.default, |e| e.value),
                    "found": found,
                }))
            }
            MemoryOp::List => {
                let args: ListArgs = parse_args(name, arguments)?;
                let category = args.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
                let entries = self.store.list(&category).await?;
                Ok(json!({
                    "category": category,
                    "count": entries.len(),
                    "entries": entries,
                }))
            }
            MemoryOp::Delete => {
                let args: KeyArgs = parse_args(name, arguments)?;
                let text = if self.store.delete(&args.key).await? {
                    format!("Memory deleted: {}", args.key)
                } else {
                    format!("Memory not found: {}", args.key)
                };
                Ok(Value::String(text))
            }
            MemoryOp::Stats => Ok(serde_json::to_value(self.store.stats().await?)?),
            MemoryOp::Cleanup => {
                let removed = self.store.cleanup_expired().await?;
                Ok(Value::String(format!(
                    "Memory cleanup completed: {removed} expired entries removed"
                )))
            }
            MemoryOp::SessionCreate => {
                let args: SessionArgs = parse_args(name, arguments)?;
                let context = args.context_data.unwrap_or_else(|| json!({}));
                self.store.create_session(&args.session_id, context).await?;
                Ok(Value::String(format!("Session created: {}", args.session_id)))
            }
        }
    }
}

/// All seven memory and session tools over one store.
pub fn memory_tools(store: Arc<dyn MemoryStore>) -> Vec<Arc<dyn Tool>> {
    [
        MemoryOp::Store,
        MemoryOp::Retrieve,
        MemoryOp::List,
        MemoryOp::Delete,
        MemoryOp::Stats,
        MemoryOp::Cleanup,
        MemoryOp::SessionCreate,
    ]
    .into_iter()
    .map(|op| Arc::new(MemoryTool::new(op, Arc::clone(&store))) as Arc<dyn Tool>)
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use conductor_memory::SqliteMemoryStore;

    fn tool(name: &str, store: &Arc<dyn MemoryStore>) -> Arc<dyn Tool> {
        memory_tools(Arc::clone(store))
            .into_iter()
            .find(|t| t.definition().name == name)
            .unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_missing_returns_default() {
        let store: Arc<dyn MemoryStore> = Arc::new(SqliteMemoryStore::in_memory().unwrap());
        let out = tool("memory_retrieve", &store)
            .call(json!({"key": "nope", "default": 7}))
            .await
            .unwrap();
        assert_eq!(out, json!({"key": "nope", "value": 7, "found": false}));
    }

    #[tokio::test]
    async fn test_store_requires_value() {
        let store: Arc<dyn MemoryStore> = Arc::new(SqliteMemoryStore::in_memory().unwrap());
        assert!(tool("memory_store", &store)
            .call(json!({"key": "k"}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_delete_reports_missing_key() {
        let store: Arc<dyn MemoryStore> = Arc::new(SqliteMemoryStore::in_memory().unwrap());
        let out = tool("memory_delete", &store)
            .call(json!({"key": "ghost"}))
            .await
            .unwrap();
        assert_eq!(out, json!("Memory not found: ghost"));
    }
}
