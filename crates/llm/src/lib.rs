//! LLM backend client and response parsing for DevSquad.
//!
//! The backends this runtime targets (local Ollama, generic
//! OpenAI-compatible SSE endpoints) have no native function calling. Tool
//! definitions are rendered into the prompt text (`prompt`), and tool
//! calls, thinking blocks, and control markers are parsed back out of the
//! raw response text (`parser`).

pub mod chat;
pub mod parser;
pub mod prompt;

pub use chat::ChatBackend;
pub use parser::{parse_response, ParsedResponse};
pub use prompt::{build_system_prompt, render_tool_definitions};

use devsquad_config::LlmConfig;
use devsquad_core::LlmError;

/// Build a backend from configuration.
pub fn build_backend(config: &LlmConfig) -> Result<ChatBackend, LlmError> {
    match config.backend.as_str() {
        "ollama" => Ok(ChatBackend::ollama(config.base_url.as_deref())),
        "remote" => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                LlmError::NotConfigured("remote backend requires llm.base_url".into())
            })?;
            Ok(ChatBackend::remote(
                "remote",
                base_url,
                config.api_key.clone().unwrap_or_default(),
            ))
        }
        other => Err(LlmError::NotConfigured(format!(
            "Unknown llm.backend '{other}'"
        ))),
    }
}
