//! Delete a workspace file.
//!
//! The reverse action is a `write_file` carrying the deleted content —
//! executing it restores byte-identical content at the same path.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use devsquad_core::error::ErrorCode;
use devsquad_core::tool::{ReverseAction, Tool, ToolContext, ToolResult};
use devsquad_store::ProjectStore;

use crate::resolve_workspace_path;

pub struct DeleteFileTool {
    store: Arc<dyn ProjectStore>,
}

impl DeleteFileTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file from the workspace. The file's content is preserved in the reverse action."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Workspace-relative path of the file to delete"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        let path = arguments["path"].as_str().unwrap_or_default();

        let disk_path = match resolve_workspace_path(&ctx.workspace_root, path) {
            Ok(p) => p,
            Err(reason) => return ToolResult::failure("delete_file", ErrorCode::InvalidArgs, reason),
        };

        if !disk_path.exists() {
            return ToolResult::failure(
                "delete_file",
                ErrorCode::FileNotFound,
                format!("File '{path}' does not exist"),
            );
        }

        let content = match tokio::fs::read_to_string(&disk_path).await {
            Ok(c) => c,
            Err(e) => {
                return ToolResult::failure(
                    "delete_file",
                    ErrorCode::ExecutionError,
                    format!("Failed to read file before deletion: {e}"),
                );
            }
        };

        if let Err(e) = tokio::fs::remove_file(&disk_path).await {
            return ToolResult::failure(
                "delete_file",
                ErrorCode::ExecutionError,
                format!("Failed to delete file: {e}"),
            );
        }

        if let Err(e) = self.store.remove_artifact(path).await {
            return ToolResult::failure("delete_file", ErrorCode::ExecutionError, e.to_string());
        }

        debug!(path = %path, "File deleted");

        ToolResult::ok_reversible(
            "delete_file",
            format!("Deleted '{path}'"),
            ReverseAction {
                tool: "write_file".into(),
                arguments: serde_json::json!({ "path": path, "content": content }),
            },
        )
    }
}
