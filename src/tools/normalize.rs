//! Argument coercion for planner-produced tool arguments.
//!
//! Planner output is untrusted and often partially typed (numbers as
//! strings, missing keys, wrong value kinds). These functions never fail:
//! every input object is coerced to valid, bounded arguments.

use serde_json::Value;

use crate::tools::document_create::DocumentCreateArgs;
use crate::tools::file_search::FileSearchArgs;

pub const SEARCH_DEFAULT_ROOT: &str = ".";
pub const SEARCH_DEFAULT_PATTERN: &str = "*.md";
pub const SEARCH_DEFAULT_MAX_RESULTS: usize = 20;
pub const SEARCH_MAX_RESULTS_CEILING: usize = 200;

pub const CREATE_DEFAULT_TITLE: &str = "Agent_Note";
pub const CREATE_DEFAULT_CONTENT: &str = "(empty)";
pub const CREATE_DEFAULT_FORMAT: &str = "md";

/// Coerce raw arguments for the file search tool.
pub fn search_args(raw: &Value) -> FileSearchArgs {
    FileSearchArgs {
        root_path: string_or(raw.get("root_path"), SEARCH_DEFAULT_ROOT),
        pattern: string_or(raw.get("pattern"), SEARCH_DEFAULT_PATTERN),
        max_results: coerce_int(raw.get("max_results"))
            .unwrap_or(SEARCH_DEFAULT_MAX_RESULTS as i64)
            .clamp(1, SEARCH_MAX_RESULTS_CEILING as i64) as usize,
    }
}

/// Coerce raw arguments for the document creation tool. `output_dir` is
/// passed through unchanged; containment is the tool's own invariant.
pub fn create_args(raw: &Value) -> DocumentCreateArgs {
    let title = trimmed_string(raw.get("title"));
    let content = trimmed_string(raw.get("content"));
    let format = trimmed_string(raw.get("format")).to_lowercase();

    DocumentCreateArgs {
        title: if title.is_empty() { CREATE_DEFAULT_TITLE.to_string() } else { title },
        content: if content.is_empty() { CREATE_DEFAULT_CONTENT.to_string() } else { content },
        format: if format == "md" || format == "txt" {
            format
        } else {
            CREATE_DEFAULT_FORMAT.to_string()
        },
        output_dir: raw
            .get("output_dir")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn string_or(value: Option<&Value>, default: &str) -> String {
    match value.and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

fn trimmed_string(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn coerce_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn search_defaults_on_empty_object() {
        let args = search_args(&json!({}));
        assert_eq!(args.root_path, ".");
        assert_eq!(args.pattern, "*.md");
        assert_eq!(args.max_results, 20);
    }

    #[test]
    fn max_results_is_clamped_not_rejected() {
        assert_eq!(search_args(&json!({"max_results": 0})).max_results, 1);
        assert_eq!(search_args(&json!({"max_results": -5})).max_results, 1);
        assert_eq!(search_args(&json!({"max_results": 9999})).max_results, 200);
        assert_eq!(search_args(&json!({"max_results": 42})).max_results, 42);
    }

    #[test]
    fn max_results_best_effort_coercion() {
        assert_eq!(search_args(&json!({"max_results": "15"})).max_results, 15);
        assert_eq!(search_args(&json!({"max_results": 7.9})).max_results, 7);
        assert_eq!(search_args(&json!({"max_results": "junk"})).max_results, 20);
        assert_eq!(search_args(&json!({"max_results": [3]})).max_results, 20);
    }

    #[test]
    fn create_defaults_fill_empty_fields() {
        let args = create_args(&json!({"title": "  ", "content": ""}));
        assert_eq!(args.title, "Agent_Note");
        assert_eq!(args.content, "(empty)");
        assert_eq!(args.format, "md");
        assert_eq!(args.output_dir, None);
    }

    #[test]
    fn create_format_is_lowercased_and_defaulted() {
        assert_eq!(create_args(&json!({"format": " TXT "})).format, "txt");
        assert_eq!(create_args(&json!({"format": "pdf"})).format, "md");
    }

    #[test]
    fn output_dir_passes_through_unchanged() {
        let args = create_args(&json!({"output_dir": "../escape"}));
        assert_eq!(args.output_dir.as_deref(), Some("../escape"));
    }
}
