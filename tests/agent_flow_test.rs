//! End-to-end agent turns over the public API with a scripted backend.

use std::sync::Arc;

use async_trait::async_trait;

use deskagent::agent::Agent;
use deskagent::backend::{BackendError, TextGenerator};
use deskagent::tools::file_search::FileSearchArgs;

/// Backend that replays a fixed response, or fails like an unreachable
/// model server.
struct ScriptedBackend {
    response: Option<String>,
}

impl ScriptedBackend {
    fn replying(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Some(response.to_string()),
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self { response: None })
    }
}

#[async_trait]
impl TextGenerator for ScriptedBackend {
    async fn invoke(&self, _prompt: &str) -> Result<String, BackendError> {
        self.response
            .clone()
            .ok_or_else(|| BackendError::Request("backend unavailable".to_string()))
    }
}

#[tokio::test]
async fn created_document_is_immediately_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().join("workspace");
    let backend = ScriptedBackend::replying(
        r#"```json
{"action":"use_tool","tool_name":"document_create_tool","arguments":{"title":"Weekly Report","content":"all green","format":"md","output_dir":"notes"}}
```"#,
    );
    let agent = Agent::new(backend, &workspace);

    let result = agent.run_prompt("save the weekly report").await.unwrap();
    assert!(result.message.starts_with("Auto selected: document_create_tool. "));

    let data = result.data.unwrap();
    let saved_path = data["tool_output"]["saved_path"].as_str().unwrap().to_string();
    assert!(std::path::Path::new(&saved_path).exists());

    // Round-trip: the fresh document is findable with matching size/mtime.
    let hits_result = agent.search_files(&FileSearchArgs {
        root_path: workspace.join("notes").to_str().unwrap().to_string(),
        pattern: "*.md".to_string(),
        max_results: 10,
    });
    assert_eq!(hits_result.message, "Found 1 file(s)");
    let hits = hits_result.data.unwrap();
    let hit = &hits[0];
    assert_eq!(
        hit["path"].as_str().unwrap(),
        std::path::Path::new(&saved_path)
            .canonicalize()
            .unwrap()
            .to_str()
            .unwrap()
    );
    let written = std::fs::metadata(&saved_path).unwrap();
    assert_eq!(hit["size"].as_u64().unwrap(), written.len());
    assert!(hit["mtime"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn respond_turn_carries_no_tool_detail() {
    let dir = tempfile::tempdir().unwrap();
    let backend =
        ScriptedBackend::replying(r#"{"action":"respond","answer":"Nothing to do here."}"#);
    let agent = Agent::new(backend, dir.path().join("workspace"));

    let result = agent.run_prompt("just say hi").await.unwrap();
    assert_eq!(result.message, "Nothing to do here.");
    let data = result.data.unwrap();
    assert_eq!(data["selected_tool"], serde_json::Value::Null);
    assert_eq!(data["tool_input"], serde_json::Value::Null);
}

#[tokio::test]
async fn unavailable_backend_still_produces_a_tool_turn() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().join("workspace");
    let agent = Agent::new(ScriptedBackend::unavailable(), &workspace);

    let result = agent
        .run_prompt("save a note titled \"Standup\" please")
        .await
        .unwrap();

    let data = result.data.clone().unwrap();
    assert_eq!(data["selected_tool"], "document_create_tool");
    assert!(result.message.contains("fallback planner"));
    assert!(data["fallback_reason"]
        .as_str()
        .unwrap()
        .contains("backend unavailable"));
}

#[tokio::test]
async fn malformed_model_output_downgrades_to_heuristic_search() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = dir.path().join("workspace");
    std::fs::create_dir_all(workspace.join("docs")).unwrap();
    std::fs::write(workspace.join("docs/a.md"), "# a\n").unwrap();

    // No JSON object anywhere in the reply.
    let backend = ScriptedBackend::replying("I think searching would be wise.");
    let agent = Agent::new(backend, &workspace);

    let prompt = format!(
        "search *.md under {} , 5 results",
        workspace.join("docs").to_str().unwrap()
    );
    let result = agent.run_prompt(&prompt).await.unwrap();

    let data = result.data.unwrap();
    assert_eq!(data["selected_tool"], "file_search_tool");
    assert_eq!(data["tool_input"]["max_results"], 5);
    assert_eq!(data["tool_output"].as_array().unwrap().len(), 1);
}
