//! Error types for the DevSquad domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error variant. Tool-domain failures are deliberately NOT
//! errors: they are `ToolResult` values carrying an [`ErrorCode`], so they
//! can never escape the tool boundary as exceptions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The top-level error type for all DevSquad operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- LLM backend errors ---
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Runtime errors ---
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Invalid task status transition: {from} → {to}")]
    InvalidTransition { from: String, to: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No persona handler registered for role: {0}")]
    PersonaNotRegistered(String),

    #[error("Context assembly failed: {0}")]
    Assembly(String),
}

/// The enumerated failure codes a tool execution can surface.
///
/// Every failed `ToolResult` carries exactly one of these. The set is
/// closed: clients and tests can match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing tool arguments (caught before execution).
    InvalidArgs,
    /// No tool registered under the requested name.
    ToolNotFound,
    /// The referenced task does not exist.
    TaskNotFound,
    /// The referenced file does not exist.
    FileNotFound,
    /// The referenced agent does not exist.
    AgentNotFound,
    /// `write_file` target already exists — use `modify_file`.
    FileExists,
    /// The agent lacks the hierarchy/hire authority for this action.
    InsufficientAuthority,
    /// An error inside tool business logic, contained at the boundary.
    ExecutionError,
}

impl ErrorCode {
    /// The wire representation, as sent to clients and logged.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgs => "INVALID_ARGS",
            Self::ToolNotFound => "TOOL_NOT_FOUND",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::AgentNotFound => "AGENT_NOT_FOUND",
            Self::FileExists => "FILE_EXISTS",
            Self::InsufficientAuthority => "INSUFFICIENT_AUTHORITY",
            Self::ExecutionError => "EXECUTION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_displays_correctly() {
        let err = Error::Llm(LlmError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn store_error_transition() {
        let err = Error::Store(StoreError::InvalidTransition {
            from: "completed".into(),
            to: "in_progress".into(),
        });
        assert!(err.to_string().contains("completed"));
        assert!(err.to_string().contains("in_progress"));
    }

    #[test]
    fn error_code_wire_format() {
        assert_eq!(ErrorCode::InvalidArgs.as_str(), "INVALID_ARGS");
        assert_eq!(ErrorCode::FileExists.as_str(), "FILE_EXISTS");
        assert_eq!(
            ErrorCode::InsufficientAuthority.as_str(),
            "INSUFFICIENT_AUTHORITY"
        );
    }

    #[test]
    fn error_code_serde_roundtrip() {
        let json = serde_json::to_string(&ErrorCode::TaskNotFound).unwrap();
        assert_eq!(json, "\"TASK_NOT_FOUND\"");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::TaskNotFound);
    }
}
