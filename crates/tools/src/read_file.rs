//! Read a workspace file. Read-only, nothing to reverse.

use async_trait::async_trait;

use devsquad_core::error::ErrorCode;
use devsquad_core::tool::{Tool, ToolContext, ToolResult};

use crate::resolve_workspace_path;

pub struct ReadFileTool;

impl ReadFileTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the content of a workspace file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Workspace-relative path of the file to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        let path = arguments["path"].as_str().unwrap_or_default();

        let disk_path = match resolve_workspace_path(&ctx.workspace_root, path) {
            Ok(p) => p,
            Err(reason) => return ToolResult::failure("read_file", ErrorCode::InvalidArgs, reason),
        };

        match tokio::fs::read_to_string(&disk_path).await {
            Ok(content) => ToolResult::ok("read_file", format!("Read '{path}' ({} bytes)", content.len()))
                .with_data(serde_json::json!({ "path": path, "content": content })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ToolResult::failure(
                "read_file",
                ErrorCode::FileNotFound,
                format!("File '{path}' does not exist"),
            ),
            Err(e) => ToolResult::failure(
                "read_file",
                ErrorCode::ExecutionError,
                format!("Failed to read file: {e}"),
            ),
        }
    }
}
