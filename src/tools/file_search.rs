//! File search tool.
//!
//! Enumerates files matching a glob pattern under one or more roots. A
//! "whole device" sentinel root expands to every mounted filesystem root;
//! anything else resolves to a single canonical path. Hits are deduplicated
//! by canonical path across roots and collection stops as soon as the cap
//! is reached. Unreadable entries and missing roots are skipped, never
//! fatal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::tools::normalize;
use crate::tools::types::{Tool, ToolDescriptor, ToolError, ToolOutcome};

pub const NAME: &str = "file_search_tool";

/// Root-path values that mean "search every mounted drive". Matched
/// case-insensitively; includes the Japanese variants the planner emits.
pub const WHOLE_DEVICE_SENTINELS: &[&str] = &[
    "this_pc",
    "this pc",
    "my computer",
    "whole computer",
    "entire computer",
    "このpc",
    "このパソコン",
    "このコンピュータ",
    "パソコン全体",
    "コンピュータ全体",
    "全ドライブ",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSearchArgs {
    pub root_path: String,
    pub pattern: String,
    pub max_results: usize,
}

/// One search result. `path` is canonical, which is also the deduplication
/// key: no two hits in one result share it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: PathBuf,
    pub size: u64,
    pub mtime: i64,
}

pub struct FileSearchTool;

impl FileSearchTool {
    /// Run a search. Never fails: an unbuildable pattern or unreadable
    /// roots simply yield no hits.
    pub fn search(&self, args: &FileSearchArgs) -> Vec<SearchHit> {
        self.search_roots(&expand_search_roots(&args.root_path), &args.pattern, args.max_results)
    }

    /// Search an explicit root list in order. Split out from [`search`] so
    /// cross-root behavior is testable without a whole-device sentinel.
    pub(crate) fn search_roots(
        &self,
        roots: &[PathBuf],
        pattern: &str,
        max_results: usize,
    ) -> Vec<SearchHit> {
        let Some(matcher) = build_matcher(pattern) else {
            tracing::warn!(%pattern, "unbuildable glob pattern, returning no hits");
            return Vec::new();
        };

        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut hits: Vec<SearchHit> = Vec::new();

        'roots: for root in roots {
            let walker = WalkBuilder::new(root)
                .standard_filters(false)
                .follow_links(true)
                .build();
            for entry in walker {
                let Ok(entry) = entry else { continue };
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if !entry_matches(&matcher, entry.path(), root) {
                    continue;
                }
                let Ok(canonical) = entry.path().canonicalize() else {
                    continue;
                };
                if !seen.insert(canonical.clone()) {
                    continue;
                }
                let Ok(metadata) = entry.metadata() else { continue };
                let mtime = metadata
                    .modified()
                    .ok()
                    .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                hits.push(SearchHit {
                    path: canonical,
                    size: metadata.len(),
                    mtime,
                });
                if hits.len() >= max_results {
                    break 'roots;
                }
            }
        }

        hits
    }
}

impl Tool for FileSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: NAME.to_string(),
            description: concat!(
                "Search for files matching a glob pattern under a directory ",
                "(recursive). root_path may be a path or the sentinel ",
                "\"this_pc\" to search every drive. Returns path, size and ",
                "mtime per hit."
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "root_path": {"type": "string"},
                    "pattern": {"type": "string"},
                    "max_results": {"type": "integer", "minimum": 1, "maximum": 200}
                }
            }),
        }
    }

    fn normalize(&self, raw: &serde_json::Value) -> serde_json::Value {
        serde_json::to_value(normalize::search_args(raw)).unwrap_or(serde_json::Value::Null)
    }

    fn invoke(&self, args: &serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: FileSearchArgs = serde_json::from_value(args.clone())
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let hits = self.search(&args);
        Ok(ToolOutcome {
            message: format!("Found {} file(s)", hits.len()),
            data: serde_json::to_value(&hits).unwrap_or(serde_json::Value::Null),
        })
    }
}

/// Expand a root path value into the concrete list of search roots.
/// Non-existent paths expand to nothing and are thereby skipped silently.
pub(crate) fn expand_search_roots(root_path: &str) -> Vec<PathBuf> {
    let trimmed = root_path.trim();
    let lowered = trimmed.to_lowercase();
    if WHOLE_DEVICE_SENTINELS.contains(&lowered.as_str()) {
        return device_roots();
    }
    match Path::new(trimmed).canonicalize() {
        Ok(root) => vec![root],
        Err(_) => Vec::new(),
    }
}

#[cfg(windows)]
fn device_roots() -> Vec<PathBuf> {
    ('A'..='Z')
        .map(|letter| PathBuf::from(format!("{letter}:\\")))
        .filter(|root| root.exists())
        .collect()
}

#[cfg(not(windows))]
fn device_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}

fn build_matcher(pattern: &str) -> Option<GlobMatcher> {
    Glob::new(pattern.trim()).ok().map(|g| g.compile_matcher())
}

/// A pattern without a separator matches file names at any depth (rglob
/// semantics); a pattern with one matches the path relative to the root.
fn entry_matches(matcher: &GlobMatcher, path: &Path, root: &Path) -> bool {
    if matcher.glob().glob().contains('/') {
        path.strip_prefix(root)
            .map(|relative| matcher.is_match(relative))
            .unwrap_or(false)
    } else {
        path.file_name().is_some_and(|name| matcher.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("notes/deep")).unwrap();
        fs::write(dir.path().join("notes/a.md"), "# a\n").unwrap();
        fs::write(dir.path().join("notes/b.txt"), "b\n").unwrap();
        fs::write(dir.path().join("notes/deep/c.md"), "# c\n").unwrap();
        dir
    }

    fn search(root: &Path, pattern: &str, max_results: usize) -> Vec<SearchHit> {
        FileSearchTool.search(&FileSearchArgs {
            root_path: root.to_str().unwrap().to_string(),
            pattern: pattern.to_string(),
            max_results,
        })
    }

    #[test]
    fn finds_matches_recursively() {
        let dir = fixture();
        let hits = search(dir.path(), "*.md", 10);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.path.extension().unwrap() == "md"));
        assert!(hits.iter().all(|h| h.path.is_absolute()));
    }

    #[test]
    fn reports_size_and_mtime() {
        let dir = fixture();
        let hits = search(&dir.path().join("notes"), "b.txt", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].size, 2);
        assert!(hits[0].mtime > 0);
    }

    #[test]
    fn caps_results_short_circuit() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("f{i:02}.md")), "x").unwrap();
        }
        let hits = search(dir.path(), "*.md", 3);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn missing_root_is_skipped_silently() {
        let hits = search(Path::new("/no/such/dir/anywhere"), "*.md", 10);
        assert!(hits.is_empty());
    }

    #[test]
    fn duplicate_paths_across_roots_are_suppressed() {
        let dir = fixture();
        let notes = dir.path().join("notes");
        let roots = vec![notes.clone(), notes.clone(), dir.path().to_path_buf()];
        let hits = FileSearchTool.search_roots(&roots, "*.md", 50);

        let mut paths: Vec<_> = hits.iter().map(|h| h.path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), hits.len(), "duplicate canonical paths returned");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn hits_follow_root_list_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("a.md"), "x").unwrap();
        fs::write(second.join("b.md"), "x").unwrap();

        let hits = FileSearchTool.search_roots(&[first, second], "*.md", 1);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("a.md"));
    }

    #[test]
    fn slash_patterns_match_relative_paths() {
        let dir = fixture();
        let hits = search(dir.path(), "notes/deep/*.md", 10);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("c.md"));
    }

    #[test]
    fn whole_device_sentinel_expands_to_absolute_roots() {
        let roots = expand_search_roots("this_pc");
        assert!(!roots.is_empty());
        assert!(roots.iter().all(|r| r.is_absolute()));
        assert_eq!(expand_search_roots("このコンピュータ"), roots);
    }

    #[test]
    fn unbuildable_pattern_yields_no_hits() {
        let dir = fixture();
        let hits = search(dir.path(), "[", 10);
        assert!(hits.is_empty());
    }
}
