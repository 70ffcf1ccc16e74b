//! Create a new file in the workspace.
//!
//! Fails with `FILE_EXISTS` if the path is already taken — modifying an
//! existing file goes through `modify_file`, which keeps version history
//! intact. No artifact record is created on a failed attempt.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use devsquad_core::error::ErrorCode;
use devsquad_core::project::Artifact;
use devsquad_core::tool::{ReverseAction, Tool, ToolContext, ToolResult};
use devsquad_store::ProjectStore;

use crate::resolve_workspace_path;

pub struct WriteFileTool {
    store: Arc<dyn ProjectStore>,
}

impl WriteFileTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create a new file with the given content. Fails if the file already exists — use modify_file to change existing files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Workspace-relative path for the new file"
                },
                "content": {
                    "type": "string",
                    "description": "The file content"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        // The registry validated presence and types already.
        let path = arguments["path"].as_str().unwrap_or_default();
        let content = arguments["content"].as_str().unwrap_or_default();

        let disk_path = match resolve_workspace_path(&ctx.workspace_root, path) {
            Ok(p) => p,
            Err(reason) => return ToolResult::failure("write_file", ErrorCode::InvalidArgs, reason),
        };

        let existing = match self.store.artifact(path).await {
            Ok(a) => a,
            Err(e) => return ToolResult::failure("write_file", ErrorCode::ExecutionError, e.to_string()),
        };
        if existing.is_some() || disk_path.exists() {
            return ToolResult::failure(
                "write_file",
                ErrorCode::FileExists,
                format!("File '{path}' already exists — use modify_file instead"),
            );
        }

        if let Some(parent) = disk_path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return ToolResult::failure(
                "write_file",
                ErrorCode::ExecutionError,
                format!("Failed to create directory: {e}"),
            );
        }

        if let Err(e) = tokio::fs::write(&disk_path, content).await {
            return ToolResult::failure(
                "write_file",
                ErrorCode::ExecutionError,
                format!("Failed to write file: {e}"),
            );
        }

        if let Err(e) = self.store.upsert_artifact(Artifact::new(path, content)).await {
            return ToolResult::failure("write_file", ErrorCode::ExecutionError, e.to_string());
        }

        debug!(path = %path, bytes = content.len(), "File created");

        ToolResult::ok_reversible(
            "write_file",
            format!("Created '{path}' ({} bytes)", content.len()),
            ReverseAction {
                tool: "delete_file".into(),
                arguments: serde_json::json!({ "path": path }),
            },
        )
    }
}
