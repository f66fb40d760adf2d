//! Text-generation backends.
//!
//! The planner depends on a single `invoke(prompt) -> text` contract; the
//! one production implementation talks to an OpenAI-compatible chat
//! completions endpoint (a locally served model in the common deployment).

mod openai;

pub use openai::OpenAiCompatBackend;

use async_trait::async_trait;

/// Errors from a text-generation backend. None of these are retried here;
/// the orchestrator treats any of them as a planner failure and downgrades
/// to the heuristic planner.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Contract between the agent core and the text-generation backend.
/// One blocking call per turn, no retries, no streaming.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, BackendError>;
}
