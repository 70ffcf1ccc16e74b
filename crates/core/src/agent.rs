//! Agent instance types — one running persona inside one project.
//!
//! Instances are never hard-deleted: lifecycle is expressed through soft
//! status changes only. The working memory is a bounded FIFO of recent
//! tool-call summaries (oldest evicted first), mutated every iteration of
//! the runtime loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::ConversationMessage;
use crate::persona::PersonaRole;
use crate::task::TaskId;

/// Unique identifier for an agent instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The runtime status of an agent instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Working,
    WaitingInput,
    Blocked,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::WaitingInput => "waiting_input",
            Self::Blocked => "blocked",
            Self::Error => "error",
        }
    }
}

/// A bounded-memory summary of one tool call, kept in working memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallSummary {
    pub tool_name: String,
    pub summary: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl ToolCallSummary {
    pub fn new(tool_name: impl Into<String>, summary: impl Into<String>, success: bool) -> Self {
        Self {
            tool_name: tool_name.into(),
            summary: summary.into(),
            success,
            timestamp: Utc::now(),
        }
    }
}

/// One running persona in one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInstance {
    pub id: AgentId,
    pub persona: PersonaRole,
    pub display_name: String,
    pub status: AgentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task: Option<TaskId>,

    /// Recent tool-call summaries; the runtime enforces the FIFO cap.
    #[serde(default)]
    pub working_memory: Vec<ToolCallSummary>,

    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,

    pub temperature: f32,
    pub model: String,

    /// 0 = top of the hierarchy (the orchestrator persona).
    pub hierarchy_level: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hired_by: Option<AgentId>,

    #[serde(default)]
    pub hired_agents: Vec<AgentId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentInstance {
    /// Create a new idle instance of the given persona.
    pub fn new(persona: PersonaRole, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AgentId::new(),
            persona,
            display_name: persona.display_name().to_string(),
            status: AgentStatus::Idle,
            current_task: None,
            working_memory: Vec::new(),
            conversation_history: Vec::new(),
            temperature: 0.7,
            model: model.into(),
            hierarchy_level: persona.hierarchy_level(),
            hired_by: None,
            hired_agents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn hired_by(mut self, hirer: AgentId) -> Self {
        self.hired_by = Some(hirer);
        self
    }
}

/// A persisted snapshot of an agent's execution state.
///
/// Written after every task execution, success or failure. Nothing in the
/// core reads checkpoints back — this is a write-only recovery artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub agent_id: AgentId,
    pub iteration_count: u32,
    pub working_memory: Vec<ToolCallSummary>,
    pub conversation_history: Vec<ConversationMessage>,
    pub created_at: DateTime<Utc>,
}

/// A log entry for one tool execution by one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: String,
    pub agent_id: AgentId,
    pub tool_name: String,
    pub arguments_summary: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(
        agent_id: AgentId,
        tool_name: impl Into<String>,
        arguments_summary: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id,
            tool_name: tool_name.into(),
            arguments_summary: arguments_summary.into(),
            success,
            timestamp: Utc::now(),
        }
    }
}
