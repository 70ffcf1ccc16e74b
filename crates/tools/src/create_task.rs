//! Create a task on the project board.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use devsquad_core::error::ErrorCode;
use devsquad_core::task::{Task, TaskPriority};
use devsquad_core::tool::{Tool, ToolContext, ToolResult};
use devsquad_store::ProjectStore;

pub struct CreateTaskTool {
    store: Arc<dyn ProjectStore>,
}

impl CreateTaskTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

fn string_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a new task with a title, description, and optional requirements, acceptance criteria, deliverables, and priority."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Short task title" },
                "description": { "type": "string", "description": "What needs to be done" },
                "priority": { "type": "string", "description": "low | medium | high | critical" },
                "requirements": { "type": "array", "description": "Concrete requirements" },
                "acceptance_criteria": { "type": "array", "description": "Done conditions" },
                "deliverables": { "type": "array", "description": "Expected outputs" }
            },
            "required": ["title", "description"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, _ctx: &ToolContext) -> ToolResult {
        let title = arguments["title"].as_str().unwrap_or_default();
        let description = arguments["description"].as_str().unwrap_or_default();

        let priority = match arguments["priority"].as_str() {
            None => TaskPriority::default(),
            Some("low") => TaskPriority::Low,
            Some("medium") => TaskPriority::Medium,
            Some("high") => TaskPriority::High,
            Some("critical") => TaskPriority::Critical,
            Some(other) => {
                return ToolResult::failure(
                    "create_task",
                    ErrorCode::InvalidArgs,
                    format!("Unknown priority '{other}' (low|medium|high|critical)"),
                );
            }
        };

        let task = Task::new(title, description)
            .with_priority(priority)
            .with_requirements(string_list(&arguments["requirements"]))
            .with_acceptance_criteria(string_list(&arguments["acceptance_criteria"]))
            .with_deliverables(string_list(&arguments["deliverables"]));
        let task_id = task.id.clone();

        if let Err(e) = self.store.insert_task(task).await {
            return ToolResult::failure("create_task", ErrorCode::ExecutionError, e.to_string());
        }

        debug!(task_id = %task_id, title = %title, "Task created");

        ToolResult::ok("create_task", format!("Created task '{title}'"))
            .with_data(serde_json::json!({ "task_id": task_id.to_string() }))
    }
}
