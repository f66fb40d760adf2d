//! Document creation tool.
//!
//! Writes a sanitized, timestamp-named document under the allowed output
//! root. The containment check on `output_dir` is the tool's core
//! invariant: the resolved target directory must be the allowed root or a
//! descendant of it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::tools::normalize;
use crate::tools::types::{Tool, ToolDescriptor, ToolError, ToolOutcome};

pub const NAME: &str = "document_create_tool";

pub const SUPPORTED_FORMATS: &[&str] = &["md", "txt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCreateArgs {
    pub title: String,
    pub content: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub output_dir: Option<String>,
}

fn default_format() -> String {
    normalize::CREATE_DEFAULT_FORMAT.to_string()
}

/// Tool result: where the document landed and in which format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub saved_path: PathBuf,
    pub format: String,
}

pub struct DocumentCreateTool {
    allowed_root: PathBuf,
}

impl DocumentCreateTool {
    pub fn new(allowed_root: impl Into<PathBuf>) -> Self {
        Self {
            allowed_root: allowed_root.into(),
        }
    }

    /// Create a document. Fails with a validation error on an unsupported
    /// format or an `output_dir` that escapes the allowed root.
    ///
    /// Filenames carry a one-second timestamp; two creations of the same
    /// title within the same second collide (last write wins).
    pub fn create(&self, args: &DocumentCreateArgs) -> Result<DocumentRecord, ToolError> {
        let format = args.format.trim().to_lowercase();
        if !SUPPORTED_FORMATS.contains(&format.as_str()) {
            return Err(ToolError::InvalidInput(format!(
                "unsupported format: {format}; expected one of md, txt"
            )));
        }

        let out_dir = self.resolve_output_dir(args.output_dir.as_deref())?;
        fs::create_dir_all(&out_dir)
            .map_err(|e| ToolError::Execution(format!("create output dir: {e}")))?;

        let file_name = format!(
            "{}_{}.{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            sanitize_title(&args.title),
            format
        );
        let path = out_dir.join(file_name);
        fs::write(&path, render_body(&args.title, &args.content, &format))
            .map_err(|e| ToolError::Execution(format!("write document: {e}")))?;

        tracing::info!(path = %path.display(), %format, "document created");

        Ok(DocumentRecord {
            saved_path: path,
            format,
        })
    }

    /// Resolve and validate the target directory. Relative paths are joined
    /// under the allowed root; the result must stay inside it.
    fn resolve_output_dir(&self, output_dir: Option<&str>) -> Result<PathBuf, ToolError> {
        fs::create_dir_all(&self.allowed_root)
            .map_err(|e| ToolError::Execution(format!("create allowed root: {e}")))?;
        let base = self
            .allowed_root
            .canonicalize()
            .map_err(|e| ToolError::Execution(format!("resolve allowed root: {e}")))?;

        let Some(dir) = output_dir.filter(|d| !d.trim().is_empty()) else {
            return Ok(base);
        };

        let requested = Path::new(dir.trim());
        let candidate = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            base.join(requested)
        };

        let target = normalize_lexically(&candidate)
            .ok_or_else(|| ToolError::OutsideRoot(dir.to_string()))?;
        if !target.starts_with(&base) {
            return Err(ToolError::OutsideRoot(dir.to_string()));
        }

        // Symlink guard: canonicalize the nearest existing ancestor and
        // require it to still sit inside the root.
        let mut ancestor = target.clone();
        loop {
            if ancestor.exists() {
                let canonical = ancestor
                    .canonicalize()
                    .map_err(|e| ToolError::Execution(format!("resolve output dir: {e}")))?;
                if !canonical.starts_with(&base) {
                    return Err(ToolError::OutsideRoot(dir.to_string()));
                }
                break;
            }
            if !ancestor.pop() {
                break;
            }
        }

        Ok(target)
    }
}

impl Tool for DocumentCreateTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: NAME.to_string(),
            description: concat!(
                "Create a local document in md or txt format under the allowed ",
                "output directory. Inputs: title, content, format (md|txt), ",
                "optional output_dir."
            )
            .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "minLength": 1, "maxLength": 200},
                    "content": {"type": "string", "minLength": 1},
                    "format": {"type": "string", "enum": ["md", "txt"]},
                    "output_dir": {"type": ["string", "null"]}
                },
                "required": ["title", "content"]
            }),
        }
    }

    fn normalize(&self, raw: &serde_json::Value) -> serde_json::Value {
        serde_json::to_value(normalize::create_args(raw)).unwrap_or(serde_json::Value::Null)
    }

    fn invoke(&self, args: &serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: DocumentCreateArgs = serde_json::from_value(args.clone())
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let record = self.create(&args)?;
        Ok(ToolOutcome {
            message: format!("Document created: {}", record.saved_path.display()),
            data: serde_json::to_value(&record).unwrap_or(serde_json::Value::Null),
        })
    }
}

/// Reduce a title to an ASCII-safe filename fragment.
fn sanitize_title(title: &str) -> String {
    let mut safe = String::with_capacity(title.len());
    let mut in_run = false;
    for ch in title.trim().chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            safe.push(ch);
            in_run = false;
        } else if !in_run {
            safe.push('_');
            in_run = true;
        }
    }
    let safe = safe.trim_matches(|c| c == '.' || c == '_');
    if safe.is_empty() {
        "document".to_string()
    } else {
        safe.to_string()
    }
}

fn render_body(title: &str, content: &str, format: &str) -> String {
    if format == "md" {
        format!("# {title}\n\n{}\n", content.trim_end())
    } else {
        let underline = "=".repeat(title.chars().count());
        format!("{title}\n{underline}\n\n{}\n", content.trim_end())
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
/// Returns `None` when `..` would climb past the path's anchor.
fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tool() -> (tempfile::TempDir, DocumentCreateTool) {
        let dir = tempfile::tempdir().unwrap();
        let tool = DocumentCreateTool::new(dir.path().join("workspace"));
        (dir, tool)
    }

    fn args(title: &str, content: &str, format: &str, output_dir: Option<&str>) -> DocumentCreateArgs {
        DocumentCreateArgs {
            title: title.to_string(),
            content: content.to_string(),
            format: format.to_string(),
            output_dir: output_dir.map(str::to_string),
        }
    }

    #[test]
    fn creates_markdown_document() {
        let (_dir, tool) = tool();
        let record = tool
            .create(&args("MVP Report", "This is a test.", "md", Some("notes")))
            .unwrap();

        assert!(record.saved_path.exists());
        assert_eq!(record.format, "md");
        let body = fs::read_to_string(&record.saved_path).unwrap();
        assert_eq!(body, "# MVP Report\n\nThis is a test.\n");
        assert!(record.saved_path.parent().unwrap().ends_with("notes"));
    }

    #[test]
    fn creates_plain_text_with_underlined_title() {
        let (_dir, tool) = tool();
        let record = tool.create(&args("Memo", "body", "txt", None)).unwrap();
        let body = fs::read_to_string(&record.saved_path).unwrap();
        assert_eq!(body, "Memo\n====\n\nbody\n");
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let (_dir, tool) = tool();
        let err = tool.create(&args("bad", "x", "pdf", None)).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let (_dir, tool) = tool();
        for dir in ["..", "../escape", "a/../../escape"] {
            let err = tool.create(&args("t", "c", "md", Some(dir))).unwrap_err();
            assert!(matches!(err, ToolError::OutsideRoot(_)), "{dir} was allowed");
        }
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let (dir, tool) = tool();
        let outside = dir.path().join("elsewhere");
        let err = tool
            .create(&args("t", "c", "md", Some(outside.to_str().unwrap())))
            .unwrap_err();
        assert!(matches!(err, ToolError::OutsideRoot(_)));
    }

    #[test]
    fn nested_relative_output_dir_is_allowed() {
        let (_dir, tool) = tool();
        let record = tool
            .create(&args("t", "c", "md", Some("a/b/c")))
            .unwrap();
        assert!(record.saved_path.exists());
    }

    #[test]
    fn sanitize_title_replaces_unsafe_runs() {
        assert_eq!(sanitize_title("MVP Report #3!"), "MVP_Report_3");
        assert_eq!(sanitize_title("  spaced   out  "), "spaced_out");
        assert_eq!(sanitize_title("...___"), "document");
        assert_eq!(sanitize_title("議事録"), "document");
        assert_eq!(sanitize_title("mixed-safe_name.v2"), "mixed-safe_name.v2");
    }

    #[test]
    fn filename_carries_timestamp_and_title() {
        let (_dir, tool) = tool();
        let record = tool.create(&args("Note", "c", "md", None)).unwrap();
        let name = record.saved_path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_Note.md"), "unexpected name: {name}");
        // YYYYMMDD_HHMMSS prefix
        assert_eq!(name.split('_').next().unwrap().len(), 8);
    }
}
