//! Turn orchestration: the plan → execute-or-respond → finalize machine.
//!
//! One `run_prompt` call is one turn. The plan node consults the model
//! planner and downgrades to the heuristic on any planner failure (the
//! only recovery policy in the system). The routing predicate sends
//! `use_tool` decisions to tool execution and everything else to the
//! respond node; finalize assembles the user-facing message and always
//! runs last.

mod state;

pub use state::{AgentResult, AgentState, StateUpdate};

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::TextGenerator;
use crate::planner::{Decision, ModelPlanner, Planner, PlannerStack};
use crate::tools::document_create::DocumentCreateArgs;
use crate::tools::file_search::FileSearchArgs;
use crate::tools::{document_create, file_search, ToolError, ToolRegistry};

const EMPTY_ANSWER_PLACEHOLDER: &str = "(no answer)";

pub struct Agent {
    planners: PlannerStack,
    registry: ToolRegistry,
    doc_tool: document_create::DocumentCreateTool,
}

impl Agent {
    /// Agent with the model planner as primary. `output_root` is the
    /// allowed root for document creation.
    pub fn new(backend: Arc<dyn TextGenerator>, output_root: impl Into<PathBuf>) -> Self {
        let output_root = output_root.into();
        let registry = ToolRegistry::new(&output_root);
        let primary = ModelPlanner::new(backend, &registry);
        Self {
            planners: PlannerStack::new(Box::new(primary)),
            registry,
            doc_tool: document_create::DocumentCreateTool::new(output_root),
        }
    }

    /// Agent with an explicit primary planner. Used by tests and callers
    /// that bring their own planning strategy.
    pub fn with_planner(primary: Box<dyn Planner>, output_root: impl Into<PathBuf>) -> Self {
        let output_root = output_root.into();
        Self {
            planners: PlannerStack::new(primary),
            registry: ToolRegistry::new(&output_root),
            doc_tool: document_create::DocumentCreateTool::new(output_root),
        }
    }

    /// Run one full turn: plan, route, execute or respond, finalize.
    ///
    /// Only tool execution can fail here; planner failures are absorbed by
    /// the heuristic downgrade inside the plan node.
    pub async fn run_prompt(&self, prompt: &str) -> Result<AgentResult, ToolError> {
        let turn_id = Uuid::new_v4();
        tracing::info!(%turn_id, "turn started");

        let mut state = AgentState::new(prompt);

        self.plan_node(&state).await.apply(&mut state);

        let routed = match &state.decision {
            Some(Decision::UseTool { .. }) => self.execute_tool_node(&state)?,
            _ => respond_node(&state),
        };
        routed.apply(&mut state);

        finalize_node(&state).apply(&mut state);

        Ok(AgentResult::from_state(state))
    }

    /// Direct document creation, bypassing planning. Used by the HTTP tool
    /// route and the CLI.
    pub fn create_document(&self, args: &DocumentCreateArgs) -> Result<AgentResult, ToolError> {
        let record = self.doc_tool.create(args)?;
        Ok(AgentResult {
            message: format!("Document created: {}", record.saved_path.display()),
            data: Some(serde_json::to_value(&record).unwrap_or(serde_json::Value::Null)),
        })
    }

    /// Direct file search, bypassing planning.
    pub fn search_files(&self, args: &FileSearchArgs) -> AgentResult {
        let hits = file_search::FileSearchTool.search(args);
        AgentResult {
            message: format!("Found {} file(s)", hits.len()),
            data: Some(serde_json::to_value(&hits).unwrap_or(serde_json::Value::Null)),
        }
    }

    async fn plan_node(&self, state: &AgentState) -> StateUpdate {
        let (decision, fallback_reason) = self.planners.plan(&state.prompt).await;
        StateUpdate {
            decision: Some(decision),
            fallback_reason,
            ..Default::default()
        }
    }

    fn execute_tool_node(&self, state: &AgentState) -> Result<StateUpdate, ToolError> {
        let Some(Decision::UseTool { tool_name, arguments }) = &state.decision else {
            // Routing guarantees a use_tool decision here.
            return Ok(StateUpdate {
                message: Some(EMPTY_ANSWER_PLACEHOLDER.to_string()),
                ..Default::default()
            });
        };

        // Both planners validate tool names, so this lookup only misses on
        // a programming error upstream; degrade instead of failing.
        let Some(tool) = self.registry.get(tool_name) else {
            tracing::error!(%tool_name, "decision referenced an unregistered tool");
            return Ok(StateUpdate {
                message: Some("Unsupported tool".to_string()),
                ..Default::default()
            });
        };

        let normalized = tool.normalize(arguments);
        tracing::info!(%tool_name, input = %normalized, "executing tool");
        let outcome = tool.invoke(&normalized)?;

        Ok(StateUpdate {
            selected_tool: Some(tool_name.clone()),
            tool_input: Some(normalized),
            tool_output: Some(outcome.data),
            message: Some(outcome.message),
            ..Default::default()
        })
    }
}

fn respond_node(state: &AgentState) -> StateUpdate {
    let answer = match &state.decision {
        Some(Decision::Respond { answer }) => answer.trim(),
        _ => "",
    };
    StateUpdate {
        message: Some(if answer.is_empty() {
            EMPTY_ANSWER_PLACEHOLDER.to_string()
        } else {
            answer.to_string()
        }),
        ..Default::default()
    }
}

/// Assemble the user-facing message: tool prefix first, fallback suffix
/// second. This is the single place the message format is composed.
fn finalize_node(state: &AgentState) -> StateUpdate {
    let mut message = state.message.clone();
    if let Some(tool_name) = &state.selected_tool {
        message = format!("Auto selected: {tool_name}. {message}");
    }
    if let Some(reason) = &state.fallback_reason {
        message.push_str(&format!(" [fallback planner: {reason}]"));
    }
    StateUpdate {
        message: Some(message),
        ..Default::default()
    }
}
