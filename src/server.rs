//! Thin HTTP mapping over the agent.
//!
//! Routes mirror the agent surface one-to-one: a chat endpoint that runs a
//! full planned turn, and direct endpoints for each tool. Handlers only
//! translate request/response shapes; all behavior lives in the agent.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::agent::{Agent, AgentResult};
use crate::tools::document_create::DocumentCreateArgs;
use crate::tools::file_search::FileSearchArgs;
use crate::tools::ToolError;

pub fn router(agent: Arc<Agent>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/agent/chat", post(chat))
        .route("/v1/tools/create", post(create_document))
        .route("/v1/tools/search", post(search_files))
        .layer(TraceLayer::new_for_http())
        .with_state(agent)
}

/// Bind and serve until the process is stopped.
pub async fn serve(agent: Arc<Agent>, bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, router(agent)).await
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    title: String,
    content: String,
    #[serde(default = "default_format")]
    format: String,
    #[serde(default)]
    output_dir: Option<String>,
}

fn default_format() -> String {
    "md".to_string()
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(default = "default_root")]
    root_path: String,
    #[serde(default = "default_pattern")]
    pattern: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_pattern() -> String {
    "*.md".to_string()
}

fn default_max_results() -> usize {
    20
}

struct ApiError(StatusCode, String);

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({"detail": self.1}))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn chat(
    State(agent): State<Arc<Agent>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<AgentResult>, ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "prompt must not be empty".to_string(),
        ));
    }
    let result = agent.run_prompt(&req.prompt).await?;
    Ok(Json(result))
}

async fn create_document(
    State(agent): State<Arc<Agent>>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<AgentResult>, ApiError> {
    if req.title.is_empty() || req.title.chars().count() > 200 {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "title must be 1..=200 characters".to_string(),
        ));
    }
    if req.content.is_empty() {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "content must not be empty".to_string(),
        ));
    }
    let result = agent.create_document(&DocumentCreateArgs {
        title: req.title,
        content: req.content,
        format: req.format,
        output_dir: req.output_dir,
    })?;
    Ok(Json(result))
}

async fn search_files(
    State(agent): State<Arc<Agent>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<AgentResult>, ApiError> {
    let result = agent.search_files(&FileSearchArgs {
        root_path: req.root_path,
        pattern: req.pattern,
        max_results: req.max_results.clamp(1, 200),
    });
    Ok(Json(result))
}
