//! Tool registry: the closed set of tools the agent can dispatch to.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::tools::document_create::DocumentCreateTool;
use crate::tools::file_search::FileSearchTool;
use crate::tools::types::{Tool, ToolDescriptor};
use crate::tools::{document_create, file_search};

pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with both built-in tools. `output_root` is the allowed
    /// root for document creation.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        let mut tools: HashMap<String, Box<dyn Tool>> = HashMap::new();
        tools.insert(
            file_search::NAME.to_string(),
            Box::new(FileSearchTool),
        );
        tools.insert(
            document_create::NAME.to_string(),
            Box::new(DocumentCreateTool::new(output_root)),
        );
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Descriptors for all registered tools, in stable name order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<_> = self.tools.values().map(|t| t.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Detailed tool reference text for the planner instruction prompt.
    pub fn tool_reference(&self) -> String {
        let mut out = String::new();
        for tool in self.descriptors() {
            out.push_str(&format!("### {}\n", tool.name));
            out.push_str(&format!("{}\n", tool.description));
            out.push_str(&format!(
                "Input schema: {}\n\n",
                serde_json::to_string(&tool.input_schema).unwrap_or_else(|_| "{}".to_string())
            ));
        }
        out
    }
}
