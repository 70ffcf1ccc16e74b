//! Run the project's linter in the workspace.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use devsquad_core::error::ErrorCode;
use devsquad_core::tool::{Tool, ToolContext, ToolResult};

pub struct RunLinterTool {
    /// The program and arguments to invoke, e.g. `["cargo", "clippy"]`.
    command: Vec<String>,
}

impl RunLinterTool {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for RunLinterTool {
    fn default() -> Self {
        Self::new(vec!["cargo".into(), "clippy".into()])
    }
}

#[async_trait]
impl Tool for RunLinterTool {
    fn name(&self) -> &str {
        "run_linter"
    }

    fn description(&self) -> &str {
        "Run the project's linter and report any findings."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        debug!(command = ?self.command, "Running linter");

        let output = Command::new(&self.command[0])
            .args(&self.command[1..])
            .current_dir(&ctx.workspace_root)
            .output()
            .await;

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let combined = format!("{stdout}\n{stderr}").trim().to_string();

                if output.status.success() {
                    ToolResult::ok("run_linter", "Lint clean")
                        .with_data(serde_json::json!({ "output": combined }))
                } else {
                    let code = output.status.code().unwrap_or(-1);
                    warn!(exit_code = code, "Linter reported findings");
                    ToolResult::failure(
                        "run_linter",
                        ErrorCode::ExecutionError,
                        format!("Linter failed (exit code {code})"),
                    )
                    .with_data(serde_json::json!({ "output": combined }))
                }
            }
            Err(e) => ToolResult::failure(
                "run_linter",
                ErrorCode::ExecutionError,
                format!("Failed to launch linter: {e}"),
            ),
        }
    }
}
