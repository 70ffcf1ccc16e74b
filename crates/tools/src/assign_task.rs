//! Assign a task to an agent. A task has at most one assignee at a time.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use devsquad_core::error::{ErrorCode, StoreError};
use devsquad_core::task::TaskId;
use devsquad_core::tool::{Tool, ToolContext, ToolResult};
use devsquad_core::AgentId;
use devsquad_store::ProjectStore;

pub struct AssignTaskTool {
    store: Arc<dyn ProjectStore>,
}

impl AssignTaskTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AssignTaskTool {
    fn name(&self) -> &str {
        "assign_task"
    }

    fn description(&self) -> &str {
        "Assign a task to an agent. Replaces any existing assignment."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string", "description": "The task to assign" },
                "agent_id": { "type": "string", "description": "The agent to assign it to" }
            },
            "required": ["task_id", "agent_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, _ctx: &ToolContext) -> ToolResult {
        let task_id = TaskId::from(arguments["task_id"].as_str().unwrap_or_default());
        let agent_id = AgentId::from(arguments["agent_id"].as_str().unwrap_or_default());

        let agent = match self.store.agent(&agent_id).await {
            Ok(a) => a,
            Err(StoreError::AgentNotFound(_)) => {
                return ToolResult::failure(
                    "assign_task",
                    ErrorCode::AgentNotFound,
                    format!("No agent with id '{agent_id}'"),
                );
            }
            Err(e) => {
                return ToolResult::failure("assign_task", ErrorCode::ExecutionError, e.to_string());
            }
        };

        let mut task = match self.store.task(&task_id).await {
            Ok(t) => t,
            Err(StoreError::TaskNotFound(_)) => {
                return ToolResult::failure(
                    "assign_task",
                    ErrorCode::TaskNotFound,
                    format!("No task with id '{task_id}'"),
                );
            }
            Err(e) => {
                return ToolResult::failure("assign_task", ErrorCode::ExecutionError, e.to_string());
            }
        };

        task.assigned_agent = Some(agent_id.clone());
        task.updated_at = chrono::Utc::now();
        if let Err(e) = self.store.update_task(&task).await {
            return ToolResult::failure("assign_task", ErrorCode::ExecutionError, e.to_string());
        }

        debug!(task_id = %task_id, agent = %agent.display_name, "Task assigned");

        ToolResult::ok(
            "assign_task",
            format!("Assigned '{}' to {}", task.title, agent.display_name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devsquad_core::task::Task;
    use devsquad_core::{AgentInstance, PersonaRole};
    use devsquad_store::InMemoryStore;

    fn ctx() -> ToolContext {
        ToolContext::new(
            AgentId::from("caller"),
            PersonaRole::Orchestrator,
            std::path::PathBuf::from("/tmp"),
        )
    }

    #[tokio::test]
    async fn assign_replaces_existing_assignee() {
        let store = Arc::new(InMemoryStore::new());
        let agent = AgentInstance::new(PersonaRole::BackendLead, "m");
        let agent_id = agent.id.clone();
        store.insert_agent(agent).await.unwrap();

        let mut task = Task::new("t", "d");
        task.assigned_agent = Some(AgentId::from("previous"));
        let task_id = task.id.clone();
        store.insert_task(task).await.unwrap();

        let tool = AssignTaskTool::new(store.clone());
        let result = tool
            .execute(
                serde_json::json!({"task_id": task_id.to_string(), "agent_id": agent_id.to_string()}),
                &ctx(),
            )
            .await;

        assert!(result.success);
        let task = store.task(&task_id).await.unwrap();
        assert_eq!(task.assigned_agent, Some(agent_id));
    }

    #[tokio::test]
    async fn unknown_agent_is_agent_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let task = Task::new("t", "d");
        let task_id = task.id.clone();
        store.insert_task(task).await.unwrap();

        let tool = AssignTaskTool::new(store);
        let result = tool
            .execute(
                serde_json::json!({"task_id": task_id.to_string(), "agent_id": "ghost"}),
                &ctx(),
            )
            .await;
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ErrorCode::AgentNotFound));
    }
}
