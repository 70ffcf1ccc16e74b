//! Runtime events — the server→client WebSocket protocol.
//!
//! Every event is a JSON object tagged with a `type` field. The runtime
//! and orchestrator emit these over an mpsc channel; the gateway forwards
//! them verbatim as text frames. No failure is dropped silently on this
//! path: every failure class has an event.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Events emitted during agent execution and team conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// Connection established.
    Connected { session_id: String },

    /// An agent began executing a task.
    AgentStart { agent_id: String, task_id: String },

    /// A new loop iteration began.
    IterationStart { iteration: u32 },

    /// Context assembly finished for this iteration.
    ContextAssembled { tokens: usize, sections: usize },

    /// Extracted `<think>` content.
    Thinking { content: String },

    /// Visible (non-final) content from an iteration.
    Content { content: String },

    /// A partial content delta while streaming.
    ContentChunk { content: String },

    /// A tool is about to execute.
    ToolCallStart {
        tool: String,
        arguments: serde_json::Value,
    },

    /// A tool finished executing.
    ToolCallResult {
        tool: String,
        success: bool,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_code: Option<ErrorCode>,
    },

    /// The agent produced its final answer.
    FinalResponse { content: String },

    /// The task was marked completed.
    TaskCompleted { task_id: String, summary: String },

    /// The agent needs user input before continuing.
    UserInputRequired { prompt: String },

    /// The agent declared itself blocked.
    Blocked { reason: String },

    /// The iteration cap was reached.
    MaxIterations { iterations: u32 },

    /// Execution stopped at a cancellation point.
    Cancelled,

    /// An unexpected failure; the current run terminates after this.
    Error { message: String },

    /// The current exchange is finished.
    Done,

    /// The team conversation paused, waiting for the user.
    WaitingForUser,

    /// A streamed chunk of a persona's reply.
    MessageChunk { speaker: String, content: String },

    /// A persona finished its reply.
    MessageComplete { speaker: String, content: String },

    /// Reply to a client ping.
    Pong,
}

impl RuntimeEvent {
    /// The wire name of this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::AgentStart { .. } => "agent_start",
            Self::IterationStart { .. } => "iteration_start",
            Self::ContextAssembled { .. } => "context_assembled",
            Self::Thinking { .. } => "thinking",
            Self::Content { .. } => "content",
            Self::ContentChunk { .. } => "content_chunk",
            Self::ToolCallStart { .. } => "tool_call_start",
            Self::ToolCallResult { .. } => "tool_call_result",
            Self::FinalResponse { .. } => "final_response",
            Self::TaskCompleted { .. } => "task_completed",
            Self::UserInputRequired { .. } => "user_input_required",
            Self::Blocked { .. } => "blocked",
            Self::MaxIterations { .. } => "max_iterations",
            Self::Cancelled => "cancelled",
            Self::Error { .. } => "error",
            Self::Done => "done",
            Self::WaitingForUser => "waiting_for_user",
            Self::MessageChunk { .. } => "message_chunk",
            Self::MessageComplete { .. } => "message_complete",
            Self::Pong => "pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_tagged() {
        let event = RuntimeEvent::IterationStart { iteration: 2 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"iteration_start""#));
        assert!(json.contains(r#""iteration":2"#));
    }

    #[test]
    fn tool_result_event_carries_code() {
        let event = RuntimeEvent::ToolCallResult {
            tool: "write_file".into(),
            success: false,
            message: "already exists".into(),
            error_code: Some(ErrorCode::FileExists),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""error_code":"FILE_EXISTS""#));
    }

    #[test]
    fn event_type_names_match_wire_tags() {
        let cases: Vec<(RuntimeEvent, &str)> = vec![
            (
                RuntimeEvent::Connected {
                    session_id: "s".into(),
                },
                "connected",
            ),
            (RuntimeEvent::Cancelled, "cancelled"),
            (RuntimeEvent::Done, "done"),
            (RuntimeEvent::WaitingForUser, "waiting_for_user"),
            (
                RuntimeEvent::MaxIterations { iterations: 5 },
                "max_iterations",
            ),
            (
                RuntimeEvent::MessageChunk {
                    speaker: "Alex".into(),
                    content: "hi".into(),
                },
                "message_chunk",
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(event.event_type(), expected);
            let json = serde_json::to_string(&event).unwrap();
            assert!(json.contains(&format!(r#""type":"{expected}""#)));
        }
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"blocked","reason":"missing credentials"}"#;
        let event: RuntimeEvent = serde_json::from_str(json).unwrap();
        match event {
            RuntimeEvent::Blocked { reason } => assert_eq!(reason, "missing credentials"),
            _ => panic!("Wrong variant"),
        }
    }
}
