//! Send a message to another agent's conversation history.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use devsquad_core::error::{ErrorCode, StoreError};
use devsquad_core::message::ConversationMessage;
use devsquad_core::tool::{Tool, ToolContext, ToolResult};
use devsquad_core::AgentId;
use devsquad_store::ProjectStore;

pub struct SendMessageTool {
    store: Arc<dyn ProjectStore>,
}

impl SendMessageTool {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SendMessageTool {
    fn name(&self) -> &str {
        "send_message"
    }

    fn description(&self) -> &str {
        "Send a message to another agent. The message lands in their conversation history and is visible on their next iteration."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "agent_id": { "type": "string", "description": "The recipient agent" },
                "content": { "type": "string", "description": "The message text" }
            },
            "required": ["agent_id", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult {
        let agent_id = AgentId::from(arguments["agent_id"].as_str().unwrap_or_default());
        let content = arguments["content"].as_str().unwrap_or_default();

        let mut recipient = match self.store.agent(&agent_id).await {
            Ok(a) => a,
            Err(StoreError::AgentNotFound(_)) => {
                return ToolResult::failure(
                    "send_message",
                    ErrorCode::AgentNotFound,
                    format!("No agent with id '{agent_id}'"),
                );
            }
            Err(e) => {
                return ToolResult::failure("send_message", ErrorCode::ExecutionError, e.to_string());
            }
        };

        recipient
            .conversation_history
            .push(ConversationMessage::agent(
                ctx.persona.display_name(),
                content,
            ));
        recipient.updated_at = chrono::Utc::now();

        if let Err(e) = self.store.update_agent(&recipient).await {
            return ToolResult::failure("send_message", ErrorCode::ExecutionError, e.to_string());
        }

        debug!(from = ctx.persona.display_name(), to = %recipient.display_name, "Message delivered");

        // Delivered messages are not recalled.
        ToolResult::ok(
            "send_message",
            format!("Message delivered to {}", recipient.display_name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devsquad_core::{AgentInstance, PersonaRole};
    use devsquad_store::InMemoryStore;

    #[tokio::test]
    async fn message_lands_in_recipient_history() {
        let store = Arc::new(InMemoryStore::new());
        let recipient = AgentInstance::new(PersonaRole::FrontendLead, "m");
        let recipient_id = recipient.id.clone();
        store.insert_agent(recipient).await.unwrap();

        let ctx = ToolContext::new(
            AgentId::from("sender"),
            PersonaRole::Orchestrator,
            std::path::PathBuf::from("/tmp"),
        );

        let tool = SendMessageTool::new(store.clone());
        let result = tool
            .execute(
                serde_json::json!({"agent_id": recipient_id.to_string(), "content": "Start on the dashboard"}),
                &ctx,
            )
            .await;

        assert!(result.success);
        assert!(!result.reversible);

        let recipient = store.agent(&recipient_id).await.unwrap();
        assert_eq!(recipient.conversation_history.len(), 1);
        assert_eq!(recipient.conversation_history[0].speaker, "Alex");
        assert!(recipient.conversation_history[0]
            .content
            .contains("dashboard"));
    }

    #[tokio::test]
    async fn unknown_recipient_fails() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = ToolContext::new(
            AgentId::from("sender"),
            PersonaRole::Orchestrator,
            std::path::PathBuf::from("/tmp"),
        );
        let tool = SendMessageTool::new(store);
        let result = tool
            .execute(
                serde_json::json!({"agent_id": "ghost", "content": "hi"}),
                &ctx,
            )
            .await;
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ErrorCode::AgentNotFound));
    }
}
