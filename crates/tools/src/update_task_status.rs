//! Change a task's status.
//!
//! Transition legality lives in the store (`set_task_status`); this tool
//! surfaces violations as contained failures. The reverse action restores
//! the prior status.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use devsquad_core::error::{ErrorCode, StoreError};
use devsquad_core::task::{TaskId, TaskStatus};
use devsquad_core::tool::{ReverseAction, Tool, ToolContext, ToolResult};
use devsquad_store::ProjectStore;

pub struct UpdateTaskStatusTool {
    store: Arc<dyn ProjectStore>,
}

impl UpdateTaskStatusTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateTaskStatusTool {
    fn name(&self) -> &str {
        "update_task_status"
    }

    fn description(&self) -> &str {
        "Move a task to a new status (todo, in_progress, completed, blocked, cancelled)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string", "description": "The task to update" },
                "status": { "type": "string", "description": "todo | in_progress | completed | blocked | cancelled" }
            },
            "required": ["task_id", "status"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, _ctx: &ToolContext) -> ToolResult {
        let task_id = TaskId::from(arguments["task_id"].as_str().unwrap_or_default());
        let status_raw = arguments["status"].as_str().unwrap_or_default();

        let Some(status) = TaskStatus::parse(status_raw) else {
            return ToolResult::failure(
                "update_task_status",
                ErrorCode::InvalidArgs,
                format!("Unknown status '{status_raw}'"),
            );
        };

        let prior = match self.store.task(&task_id).await {
            Ok(task) => task.status,
            Err(StoreError::TaskNotFound(_)) => {
                return ToolResult::failure(
                    "update_task_status",
                    ErrorCode::TaskNotFound,
                    format!("No task with id '{task_id}'"),
                );
            }
            Err(e) => {
                return ToolResult::failure(
                    "update_task_status",
                    ErrorCode::ExecutionError,
                    e.to_string(),
                );
            }
        };

        match self.store.set_task_status(&task_id, status).await {
            Ok(task) => {
                debug!(task_id = %task_id, from = prior.as_str(), to = status.as_str(), "Task status updated");
                ToolResult::ok_reversible(
                    "update_task_status",
                    format!("Task '{}' is now {}", task.title, status.as_str()),
                    ReverseAction {
                        tool: "update_task_status".into(),
                        arguments: serde_json::json!({
                            "task_id": task_id.to_string(),
                            "status": prior.as_str(),
                        }),
                    },
                )
            }
            Err(StoreError::InvalidTransition { from, to }) => ToolResult::failure(
                "update_task_status",
                ErrorCode::ExecutionError,
                format!("Illegal transition {from} → {to}"),
            ),
            Err(e) => ToolResult::failure(
                "update_task_status",
                ErrorCode::ExecutionError,
                e.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devsquad_core::task::Task;
    use devsquad_core::{AgentId, PersonaRole};
    use devsquad_store::InMemoryStore;

    fn ctx() -> ToolContext {
        ToolContext::new(
            AgentId::from("a1"),
            PersonaRole::Orchestrator,
            std::path::PathBuf::from("/tmp"),
        )
    }

    #[tokio::test]
    async fn status_update_with_reverse() {
        let store = Arc::new(InMemoryStore::new());
        let task = Task::new("t", "d");
        let id = task.id.clone();
        store.insert_task(task).await.unwrap();

        let tool = UpdateTaskStatusTool::new(store.clone());
        let result = tool
            .execute(
                serde_json::json!({"task_id": id.to_string(), "status": "in_progress"}),
                &ctx(),
            )
            .await;

        assert!(result.success);
        let reverse = result.reverse_action.unwrap();
        assert_eq!(reverse.arguments["status"], "todo");
    }

    #[tokio::test]
    async fn idempotent_repeat_produces_same_state_and_two_log_entries() {
        let store = Arc::new(InMemoryStore::new());
        let task = Task::new("t", "d");
        let id = task.id.clone();
        store.insert_task(task).await.unwrap();

        let tool = UpdateTaskStatusTool::new(store.clone());
        let args = serde_json::json!({"task_id": id.to_string(), "status": "in_progress"});

        let first = tool.execute(args.clone(), &ctx()).await;
        let second = tool.execute(args, &ctx()).await;
        assert!(first.success);
        assert!(second.success);

        let task = store.task(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);

        // Exactly the two explicit calls appear in the log.
        assert_eq!(store.status_changes(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_task_is_task_not_found() {
        let tool = UpdateTaskStatusTool::new(Arc::new(InMemoryStore::new()));
        let result = tool
            .execute(
                serde_json::json!({"task_id": "ghost", "status": "in_progress"}),
                &ctx(),
            )
            .await;
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ErrorCode::TaskNotFound));
    }

    #[tokio::test]
    async fn illegal_transition_is_contained() {
        let store = Arc::new(InMemoryStore::new());
        let task = Task::new("t", "d");
        let id = task.id.clone();
        store.insert_task(task).await.unwrap();

        let tool = UpdateTaskStatusTool::new(store);
        let result = tool
            .execute(
                serde_json::json!({"task_id": id.to_string(), "status": "completed"}),
                &ctx(),
            )
            .await;
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ErrorCode::ExecutionError));
    }
}
