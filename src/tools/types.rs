//! Shared types and traits for the tool system.

use serde::{Deserialize, Serialize};

/// Describes a tool to the planner: name, human description, and a JSON
/// schema for its arguments. Rendered into the model instruction prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Result of a successful tool invocation: the user-facing message the
/// orchestrator copies into the turn state, plus the raw result payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub message: String,
    pub data: serde_json::Value,
}

/// Errors a tool can surface to the caller. Validation failures are
/// rejected requests (HTTP 400 at the API boundary); execution failures
/// are environment problems.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("output path escapes allowed root: {0}")]
    OutsideRoot(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    /// True for errors caused by the request rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(self, ToolError::InvalidInput(_) | ToolError::OutsideRoot(_))
    }
}

/// Trait implemented by both agent tools.
///
/// `normalize` coerces an arbitrary planner-produced argument object into a
/// valid, bounded argument object and never fails; the orchestrator records
/// its output as the turn's `tool_input` before calling `invoke` with it.
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    fn normalize(&self, raw: &serde_json::Value) -> serde_json::Value;

    fn invoke(&self, args: &serde_json::Value) -> Result<ToolOutcome, ToolError>;
}
