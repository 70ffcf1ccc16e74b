//! Modify an existing workspace file.
//!
//! The reverse action is another `modify_file` carrying the prior content,
//! so applying it restores the previous observable state.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use devsquad_core::error::ErrorCode;
use devsquad_core::project::Artifact;
use devsquad_core::tool::{ReverseAction, Tool, ToolContext, ToolResult};
use devsquad_store::ProjectStore;

use crate::resolve_workspace_path;

pub struct ModifyFileTool {
    store: Arc<dyn ProjectStore>,
}

impl ModifyFileTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ModifyFileTool {
    fn name(&self) -> &str {
        "modify_file"
    }

    fn description(&self) -> &str {
        "Replace the content of an existing file. Fails if the file does not exist — use write_file to create new files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Workspace-relative path of the file to modify"
                },
                "content": {
                    "type": "string",
                    "description": "The new file content"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        let path = arguments["path"].as_str().unwrap_or_default();
        let content = arguments["content"].as_str().unwrap_or_default();

        let disk_path = match resolve_workspace_path(&ctx.workspace_root, path) {
            Ok(p) => p,
            Err(reason) => return ToolResult::failure("modify_file", ErrorCode::InvalidArgs, reason),
        };

        if !disk_path.exists() {
            return ToolResult::failure(
                "modify_file",
                ErrorCode::FileNotFound,
                format!("File '{path}' does not exist — use write_file to create it"),
            );
        }

        let previous = match tokio::fs::read_to_string(&disk_path).await {
            Ok(c) => c,
            Err(e) => {
                return ToolResult::failure(
                    "modify_file",
                    ErrorCode::ExecutionError,
                    format!("Failed to read existing file: {e}"),
                );
            }
        };

        if let Err(e) = tokio::fs::write(&disk_path, content).await {
            return ToolResult::failure(
                "modify_file",
                ErrorCode::ExecutionError,
                format!("Failed to write file: {e}"),
            );
        }

        let version = match self.store.artifact(path).await {
            Ok(Some(existing)) => existing.version + 1,
            Ok(None) => 1,
            Err(e) => {
                return ToolResult::failure("modify_file", ErrorCode::ExecutionError, e.to_string());
            }
        };
        let mut artifact = Artifact::new(path, content);
        artifact.version = version;
        if let Err(e) = self.store.upsert_artifact(artifact).await {
            return ToolResult::failure("modify_file", ErrorCode::ExecutionError, e.to_string());
        }

        debug!(path = %path, version, "File modified");

        ToolResult::ok_reversible(
            "modify_file",
            format!("Modified '{path}' (v{version}, {} bytes)", content.len()),
            ReverseAction {
                tool: "modify_file".into(),
                arguments: serde_json::json!({ "path": path, "content": previous }),
            },
        )
    }
}
