//! Conversation message types.
//!
//! Messages flow through two places: an agent's own conversation history
//! (persisted on the instance) and the orchestrator's session log
//! (in-memory, append-only within a session).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The end user.
    User,
    /// An AI persona.
    Agent,
    /// System instructions.
    System,
    /// A tool execution result fed back to the model.
    Tool,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Speaker name: "User", a persona name ("Alex", "Sarah", ...), or "System".
    pub speaker: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: "User".into(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn agent(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            role: MessageRole::Agent,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            speaker: "System".into(),
            role: MessageRole::System,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn tool(tool_name: &str, content: impl Into<String>) -> Self {
        Self {
            speaker: format!("tool:{tool_name}"),
            role: MessageRole::Tool,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
