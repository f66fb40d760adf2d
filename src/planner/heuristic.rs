//! Deterministic fallback planner.
//!
//! No model, no network: keyword scoring picks the tool and regexes pull
//! the arguments out of the prompt. Always returns a `UseTool` decision —
//! there is no heuristic "respond" path. Cue lists carry both English and
//! Japanese forms because prompts arrive in either.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::planner::Decision;
use crate::tools::{document_create, file_search};

/// Creation-intent cues. Ties in the keyword score favor document
/// creation, so this list deliberately stays free of words that show up in
/// search prompts (e.g. "note" would match "notes/").
const CREATE_KEYWORDS: &[&str] = &[
    "create", "write", "draft", "save", "document", "memo", "report",
    "作成", "作って", "書いて", "保存", "メモ", "議事録", "まとめて", "ドキュメント",
];

const SEARCH_KEYWORDS: &[&str] = &[
    "search", "find", "look for", "locate", "list", "files",
    "検索", "探して", "探す", "一覧", "教えて", "ファイル",
];

/// Prompt phrases that mean "search the whole computer". Mapped to the
/// sentinel root the search tool expands.
const WHOLE_DEVICE_PHRASES: &[&str] = &[
    "this pc", "this_pc", "my computer", "whole computer", "entire computer",
    "このpc", "このパソコン", "このコンピュータ", "パソコン全体", "コンピュータ全体", "全ドライブ",
];

const WHOLE_DEVICE_SENTINEL: &str = "this_pc";

static GLOB_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\.[A-Za-z0-9]+").expect("glob token regex"));

// Path token written before a folder cue ("workspace/notes配下", "notes フォルダ").
static ROOT_BEFORE_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9_.~/\\-]+)\s*(?:フォルダ|配下|以下|の中|folder|directory)")
        .expect("root-before-cue regex")
});

// Path token written after a locating preposition ("under notes/").
static ROOT_AFTER_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:under|inside|within|in|from)\s+([A-Za-z0-9_.~/\\-]+)")
        .expect("root-after-cue regex")
});

static RESULT_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:件|results?|hits?|matches)").expect("result count regex")
});

static QUOTED_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)"|'([^']+)'|「([^」]+)」|『([^』]+)』"#).expect("quoted span regex")
});

#[derive(Default)]
pub struct HeuristicPlanner;

impl HeuristicPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Infallible planning: score the prompt, pick a tool, extract its
    /// arguments.
    pub fn decide(&self, prompt: &str) -> Decision {
        let lowered = prompt.to_lowercase();
        let search_score = keyword_score(&lowered, SEARCH_KEYWORDS);
        let create_score = keyword_score(&lowered, CREATE_KEYWORDS);

        tracing::debug!(search_score, create_score, "heuristic keyword scores");

        if search_score > create_score {
            Decision::UseTool {
                tool_name: file_search::NAME.to_string(),
                arguments: extract_search_arguments(prompt, &lowered),
            }
        } else {
            Decision::UseTool {
                tool_name: document_create::NAME.to_string(),
                arguments: extract_create_arguments(prompt, &lowered),
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::planner::Planner for HeuristicPlanner {
    async fn plan(&self, prompt: &str) -> Result<Decision, crate::planner::PlannerError> {
        Ok(self.decide(prompt))
    }
}

fn keyword_score(lowered: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| lowered.contains(*k)).count()
}

fn extract_search_arguments(prompt: &str, lowered: &str) -> serde_json::Value {
    json!({
        "root_path": extract_root_path(prompt, lowered),
        "pattern": extract_pattern(prompt, lowered),
        "max_results": extract_max_results(prompt),
    })
}

fn extract_pattern(prompt: &str, lowered: &str) -> String {
    if let Some(found) = GLOB_TOKEN.find(prompt) {
        return found.as_str().to_string();
    }
    if lowered.contains("py") {
        "*.py".to_string()
    } else if lowered.contains("txt") {
        "*.txt".to_string()
    } else if lowered.contains("md") || lowered.contains("markdown") {
        "*.md".to_string()
    } else {
        "*".to_string()
    }
}

fn extract_root_path(prompt: &str, lowered: &str) -> String {
    if WHOLE_DEVICE_PHRASES.iter().any(|p| lowered.contains(p)) {
        return WHOLE_DEVICE_SENTINEL.to_string();
    }
    extract_dir_token(prompt).unwrap_or_else(|| ".".to_string())
}

/// First path-like token attached to a folder cue, if any.
fn extract_dir_token(prompt: &str) -> Option<String> {
    ROOT_BEFORE_CUE
        .captures(prompt)
        .or_else(|| ROOT_AFTER_CUE.captures(prompt))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', ',']).to_string())
        .filter(|token| !token.is_empty())
}

fn extract_max_results(prompt: &str) -> u64 {
    RESULT_COUNT
        .captures(prompt)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(|n| n.clamp(1, 200))
        .unwrap_or(20)
}

fn extract_create_arguments(prompt: &str, lowered: &str) -> serde_json::Value {
    let format = if lowered.contains("txt") { "txt" } else { "md" };
    let spans = quoted_spans(prompt);

    let (title, content) = match spans.len() {
        0 => (fallback_title(prompt), prompt.trim().to_string()),
        1 => (spans[0].clone(), prompt.trim().to_string()),
        _ => (spans[0].clone(), spans[1].clone()),
    };

    json!({
        "title": title,
        "content": content,
        "format": format,
        "output_dir": extract_dir_token(prompt),
    })
}

fn quoted_spans(prompt: &str) -> Vec<String> {
    QUOTED_SPAN
        .captures_iter(prompt)
        .filter_map(|caps| {
            (1..=4)
                .find_map(|i| caps.get(i))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

/// Whitespace-collapsed prompt truncated to 40 characters, or the fixed
/// fallback when that leaves nothing.
fn fallback_title(prompt: &str) -> String {
    let collapsed = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    let title: String = collapsed.chars().take(40).collect();
    if title.is_empty() {
        "Agent_Note".to_string()
    } else {
        title
    }
}
