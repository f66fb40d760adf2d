//! Planner abstraction: turning a free-text prompt into a typed decision.
//!
//! Two implementations exist behind one trait, selected at construction
//! time: [`ModelPlanner`] asks the text-generation backend, and
//! [`HeuristicPlanner`] is the deterministic, network-free fallback.
//! [`PlannerStack`] is the explicit fallback wrapper the orchestrator uses.

mod heuristic;
mod model;

pub use heuristic::HeuristicPlanner;
pub use model::ModelPlanner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::BackendError;
use crate::tools::{document_create, file_search};

/// The closed set of tool names a decision may carry.
pub const TOOL_NAMES: &[&str] = &[file_search::NAME, document_create::NAME];

/// The planner's output: call a tool, or answer directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    UseTool {
        tool_name: String,
        arguments: serde_json::Value,
    },
    Respond {
        answer: String,
    },
}

/// Ways the model planner can fail. Every variant is recovered by the
/// orchestrator's downgrade to the heuristic planner.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("text generation failed: {0}")]
    Backend(#[from] BackendError),
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("no JSON object in model response: {snippet}")]
    NoJsonObject { snippet: String },
    #[error("model JSON did not parse: {source}; raw: {snippet}")]
    MalformedJson {
        source: serde_json::Error,
        snippet: String,
    },
    #[error("invalid decision: {0}")]
    InvalidDecision(String),
}

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, prompt: &str) -> Result<Decision, PlannerError>;
}

/// Primary planner plus the heuristic downgrade. One automatic fallback,
/// no further retries.
pub struct PlannerStack {
    primary: Box<dyn Planner>,
    fallback: HeuristicPlanner,
}

impl PlannerStack {
    pub fn new(primary: Box<dyn Planner>) -> Self {
        Self {
            primary,
            fallback: HeuristicPlanner::new(),
        }
    }

    /// Plan a turn. Returns the decision and, when the primary planner
    /// failed, the reason the heuristic was substituted.
    pub async fn plan(&self, prompt: &str) -> (Decision, Option<String>) {
        match self.primary.plan(prompt).await {
            Ok(decision) => (decision, None),
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(%reason, "model planner failed, using heuristic planner");
                (self.fallback.decide(prompt), Some(reason))
            }
        }
    }
}

/// Truncate raw model output for diagnostics.
pub(crate) fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}...")
    }
}
