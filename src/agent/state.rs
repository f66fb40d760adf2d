//! Per-turn agent state and the public result type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::planner::Decision;

/// Transient record threaded through the state machine. Created fresh per
/// turn, mutated additively by each node, discarded when the turn ends —
/// nothing persists across calls.
#[derive(Debug, Clone, Serialize)]
pub struct AgentState {
    pub prompt: String,
    pub decision: Option<Decision>,
    pub selected_tool: Option<String>,
    pub tool_input: Option<Value>,
    pub tool_output: Option<Value>,
    pub message: String,
    pub fallback_reason: Option<String>,
}

impl AgentState {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            decision: None,
            selected_tool: None,
            tool_input: None,
            tool_output: None,
            message: String::new(),
            fallback_reason: None,
        }
    }
}

/// Partial update returned by a node. Fields left `None` keep their
/// current value when merged; nodes only ever add, never clear.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub decision: Option<Decision>,
    pub selected_tool: Option<String>,
    pub tool_input: Option<Value>,
    pub tool_output: Option<Value>,
    pub message: Option<String>,
    pub fallback_reason: Option<String>,
}

impl StateUpdate {
    pub fn apply(self, state: &mut AgentState) {
        if let Some(decision) = self.decision {
            state.decision = Some(decision);
        }
        if let Some(selected_tool) = self.selected_tool {
            state.selected_tool = Some(selected_tool);
        }
        if let Some(tool_input) = self.tool_input {
            state.tool_input = Some(tool_input);
        }
        if let Some(tool_output) = self.tool_output {
            state.tool_output = Some(tool_output);
        }
        if let Some(message) = self.message {
            state.message = message;
        }
        if let Some(fallback_reason) = self.fallback_reason {
            state.fallback_reason = Some(fallback_reason);
        }
    }
}

/// Public outcome of an agent call: the user-facing message plus an
/// optional data payload (raw tool result for direct tool calls, the full
/// turn detail for `run_prompt`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub message: String,
    pub data: Option<Value>,
}

impl AgentResult {
    /// Derive the public result from a finished turn.
    pub(crate) fn from_state(state: AgentState) -> Self {
        let data = serde_json::json!({
            "selected_tool": state.selected_tool,
            "tool_input": state.tool_input,
            "tool_output": state.tool_output,
            "fallback_reason": state.fallback_reason,
        });
        Self {
            message: state.message,
            data: Some(data),
        }
    }
}
