#![allow(clippy::unwrap_used, clippy::expect_used)]
//! The tool server driven end to end over in-memory input and output.

use async_trait::async_trait;
use conductor_core::{Artifact, ConductorError, ConductorResult};
use conductor_mcp::*;
use conductor_memory::{MemoryStore, SqliteMemoryStore};
use conductor_orchestrator::{OrchestrationConfig, Orchestrator, Task, TaskExecutor};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

struct FailingExecutor;

#[async_trait]
impl TaskExecutor for FailingExecutor {
    async fn execute(&self, _agent: &str, task: &Task) -> ConductorResult<Vec<Artifact>> {
        Err(ConductorError::Worker(format!("cannot do {}", task.name)))
    }
}

fn server(executor: Option<Arc<dyn TaskExecutor>>) -> McpServer {
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteMemoryStore::in_memory().unwrap());
    let orchestrator = Arc::new(Mutex::new(
        Orchestrator::new(OrchestrationConfig::default()).unwrap(),
    ));
    McpServer::with_default_tools(store, orchestrator, executor)
}

async fn run(server: &McpServer, input: &str) -> (Vec<Value>, ServeStats) {
    let mut out = Vec::new();
    let stats = server.serve(input.as_bytes(), &mut out).await.unwrap();
    let lines = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    (lines, stats)
}

fn call(name: &str, arguments: Value) -> String {
    json!({"method": "tools/call", "params": {"name": name, "arguments": arguments}}).to_string()
}

fn text(response: &Value) -> &str {
    response["content"][0]["text"].as_str().unwrap()
}

// ---------------------------------------------------------------------------
// 1. Handshake and listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_list_and_ping() {
    let server = server(None);
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"method":"tools/list"}"#,
        "\n\n",
        r#"{"method":"ping"}"#,
        "\n"
    );
    let (responses, stats) = run(&server, input).await;

    assert_eq!(responses.len(), 3);
    assert_eq!(stats.requests, 3);
    assert_eq!(responses[0]["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(responses[0]["serverInfo"]["name"], "conductor");

    let names: Vec<&str> = responses[1]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "memory_store",
            "memory_retrieve",
            "memory_list",
            "memory_delete",
            "memory_stats",
            "memory_cleanup",
            "session_create",
            "orchestrate",
            "orchestrator_status",
            "usage_stats",
        ]
    );
    assert!(responses[1]["tools"][0]["inputSchema"].is_object());
    assert_eq!(responses[2], json!({}));
}

// ---------------------------------------------------------------------------
// 2. Bad input never stops the loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn errors_are_answered_and_loop_continues() {
    let server = server(None);
    let input = [
        "{not json".to_string(),
        r#"{"method":"resources/list"}"#.to_string(),
        call("launch_rockets", json!({})),
        call("memory_retrieve", json!({})),
        r#"{"method":"ping"}"#.to_string(),
    ]
    .join("\n");
    let (responses, stats) = run(&server, &input).await;

    assert_eq!(responses.len(), 5);
    assert_eq!(stats.parse_errors, 1);
    assert!(responses[0]["error"].is_string());
    assert_eq!(responses[1], json!({"error": "Unknown method: resources/list"}));
    assert_eq!(text(&responses[2]), "Unknown tool: launch_rockets");
    assert_eq!(responses[2]["isError"], true);
    assert!(text(&responses[3]).starts_with("Tool execution error:"));
    assert_eq!(responses[4], json!({}));
}

// ---------------------------------------------------------------------------
// 3. Memory tools share one store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn memory_round_trip_through_tools() {
    let server = server(None);
    let input = [
        call(
            "memory_store",
            json!({"key": "theme", "value": {"dark": true}, "category": "user_prefs"}),
        ),
        call("memory_retrieve", json!({"key": "theme"})),
        call("memory_list", json!({"category": "user_prefs"})),
        call("memory_delete", json!({"key": "theme"})),
        call("memory_cleanup", json!({})),
        call("session_create", json!({"session_id": "s-9"})),
        call("memory_stats", json!({})),
    ]
    .join("\n");
    let (responses, _) = run(&server, &input).await;

    assert_eq!(text(&responses[0]), "Memory stored successfully: theme");

    let retrieved: Value = serde_json::from_str(text(&responses[1])).unwrap();
    assert_eq!(retrieved["found"], true);
    assert_eq!(retrieved["value"], json!({"dark": true}));

    let listed: Value = serde_json::from_str(text(&responses[2])).unwrap();
    assert_eq!(listed["count"], 1);

    assert_eq!(text(&responses[3]), "Memory deleted: theme");
    assert_eq!(
        text(&responses[4]),
        "Memory cleanup completed: 0 expired entries removed"
    );
    assert_eq!(text(&responses[5]), "Session created: s-9");

    let stats: Value = serde_json::from_str(text(&responses[6])).unwrap();
    assert_eq!(stats["total_entries"], 0);
    assert_eq!(stats["sessions"], 1);
}

#[tokio::test]
async fn out_of_range_expiry_is_rejected_not_stored() {
    let server = server(None);
    let input = [
        call(
            "memory_store",
            json!({"key": "k", "value": 1, "expires_hours": 10_000_000_000u64}),
        ),
        call(
            "memory_store",
            json!({"key": "k", "value": 1, "expires_hours": u64::MAX}),
        ),
        call("memory_retrieve", json!({"key": "k"})),
        call("memory_store", json!({"key": "k", "value": 1, "expires_hours": 1})),
        call("memory_retrieve", json!({"key": "k"})),
    ]
    .join("\n");
    let (responses, stats) = run(&server, &input).await;

    assert_eq!(stats.requests, 5);
    for rejected in &responses[..2] {
        assert_eq!(rejected["isError"], true);
        assert!(text(rejected).contains("Invalid argument"), "{rejected}");
    }
    let missing: Value = serde_json::from_str(text(&responses[2])).unwrap();
    assert_eq!(missing["found"], false);

    let kept: Value = serde_json::from_str(text(&responses[4])).unwrap();
    assert_eq!(kept["found"], true);
    assert_eq!(kept["value"], 1);
}

// ---------------------------------------------------------------------------
// 4. Orchestration, execution failures and usage accounting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn orchestrate_execute_and_count_usage() {
    let server = server(Some(Arc::new(FailingExecutor)));
    let input = [
        call("orchestrate", json!({"execute": true})),
        call("orchestrator_status", json!({})),
        call("nope", json!({})),
        call("usage_stats", json!({})),
    ]
    .join("\n");
    let (responses, _) = run(&server, &input).await;

    let outcome: Value = serde_json::from_str(text(&responses[0])).unwrap();
    assert_eq!(outcome["assigned"].as_array().unwrap().len(), 2);
    // Failed executions still complete their tasks.
    assert_eq!(outcome["execution"]["completed"].as_array().unwrap().len(), 2);
    assert_eq!(outcome["execution"]["failures"].as_array().unwrap().len(), 2);

    let status: Value = serde_json::from_str(text(&responses[1])).unwrap();
    assert_eq!(status["completed"], 2);
    assert_eq!(status["assigned"], 0);

    // Unknown tools are not counted; usage_stats sees the two calls before it.
    let usage: Value = serde_json::from_str(text(&responses[3])).unwrap();
    assert_eq!(usage["total_tool_calls"], 2);
    assert_eq!(usage["success_rate"], 100.0);
}
