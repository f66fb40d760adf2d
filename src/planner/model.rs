//! Model-backed planner: prompt construction, JSON extraction, and
//! decision validation.
//!
//! This component performs no filesystem or tool work. It translates free
//! model text into a typed [`Decision`], and every malformed output becomes
//! an explicit [`PlannerError`] the orchestrator can recover from.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::backend::TextGenerator;
use crate::planner::{snippet, Decision, Planner, PlannerError, TOOL_NAMES};
use crate::tools::ToolRegistry;

pub struct ModelPlanner {
    backend: Arc<dyn TextGenerator>,
    tool_reference: String,
}

impl ModelPlanner {
    pub fn new(backend: Arc<dyn TextGenerator>, registry: &ToolRegistry) -> Self {
        Self {
            backend,
            tool_reference: registry.tool_reference(),
        }
    }

    /// Fixed instruction prompt; the raw user prompt goes verbatim at the
    /// end.
    fn instruction_prompt(&self, user_prompt: &str) -> String {
        format!(
            "You are a single-turn planning agent. Decide whether to call one \
             of the tools below or to answer directly, and reply with exactly \
             one JSON object, nothing else.\n\n\
             Allowed actions:\n\
             - {{\"action\":\"use_tool\",\"tool_name\":\"<tool>\",\"arguments\":{{...}}}}\n\
             - {{\"action\":\"respond\",\"answer\":\"<text>\"}}\n\n\
             Tools:\n{}\
             Return only JSON.\n\n\
             User request:\n{}",
            self.tool_reference, user_prompt
        )
    }
}

#[async_trait]
impl Planner for ModelPlanner {
    async fn plan(&self, prompt: &str) -> Result<Decision, PlannerError> {
        let raw = self.backend.invoke(&self.instruction_prompt(prompt)).await?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PlannerError::EmptyResponse);
        }

        let json_text = extract_json_object(raw).ok_or_else(|| PlannerError::NoJsonObject {
            snippet: snippet(raw),
        })?;
        let value: Value =
            serde_json::from_str(&json_text).map_err(|source| PlannerError::MalformedJson {
                source,
                snippet: snippet(raw),
            })?;

        decision_from_value(&value)
    }
}

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("fenced JSON regex")
});

/// Two-stage JSON extraction: a fenced code block first, then the first
/// top-level `{...}` span anywhere in the text.
pub(crate) fn extract_json_object(text: &str) -> Option<String> {
    if let Some(caps) = FENCED_JSON.captures(text) {
        return Some(caps[1].to_string());
    }
    first_object_span(text)
}

/// Scan from the first `{` to its balancing `}`, skipping string literals.
fn first_object_span(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Validate a parsed JSON object into a [`Decision`].
fn decision_from_value(value: &Value) -> Result<Decision, PlannerError> {
    let action = value
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| PlannerError::InvalidDecision("missing or non-string \"action\"".into()))?;

    match action {
        "respond" => Ok(Decision::Respond {
            answer: coerce_answer(value.get("answer")),
        }),
        "use_tool" => {
            let tool_name = value
                .get("tool_name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    PlannerError::InvalidDecision("missing or non-string \"tool_name\"".into())
                })?;
            if !TOOL_NAMES.contains(&tool_name) {
                return Err(PlannerError::InvalidDecision(format!(
                    "unknown tool_name: {tool_name}"
                )));
            }
            let arguments = match value.get("arguments") {
                None | Some(Value::Null) => serde_json::json!({}),
                Some(object @ Value::Object(_)) => object.clone(),
                Some(other) => {
                    return Err(PlannerError::InvalidDecision(format!(
                        "\"arguments\" must be an object, got {}",
                        json_kind(other)
                    )))
                }
            };
            Ok(Decision::UseTool {
                tool_name: tool_name.to_string(),
                arguments,
            })
        }
        other => Err(PlannerError::InvalidDecision(format!(
            "unknown action: {other}"
        ))),
    }
}

fn coerce_answer(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
