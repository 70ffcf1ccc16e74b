//! LlmBackend trait — the abstraction over chat/completion endpoints.
//!
//! A backend knows how to send a prompt to an LLM and get text back,
//! either as a complete response or as a stream of deltas. The backends
//! this runtime targets have no native function calling: tool definitions
//! are rendered into the prompt text and tool calls are parsed back out of
//! the raw response by `devsquad-llm`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// A tool definition rendered into the prompt so the model knows what it
/// can call. The same triple is the source of truth for the registry's
/// argument validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A request for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "qwen2.5-coder:14b").
    pub model: String,

    /// The user-visible prompt body.
    pub prompt: String,

    /// Optional system prompt (persona identity + tool definitions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tool definitions to inject into the prompt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Stop sequences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.7
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
            stop: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete (non-streaming) generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// The raw generated text (thinking and tool-call blocks included).
    pub text: String,

    /// Token usage, when the backend reports it.
    pub usage: Option<Usage>,

    /// Which model actually responded.
    pub model: String,
}

/// A single chunk in a streaming generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationChunk {
    /// Partial text delta.
    #[serde(default)]
    pub delta: Option<String>,

    /// Whether this is the final chunk.
    #[serde(default)]
    pub done: bool,

    /// Usage info (typically only in the final chunk).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// The core LLM backend trait.
///
/// Implementations: Ollama (local), any OpenAI-compatible SSE endpoint.
/// The runtime calls `generate()` or `generate_stream()` without knowing
/// which backend is behind the trait.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and get the complete generated text.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<Generation, LlmError>;

    /// Send a request and get a stream of text deltas.
    ///
    /// Default implementation calls `generate()` and wraps the result as a
    /// single chunk.
    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<GenerationChunk, LlmError>>,
        LlmError,
    > {
        let generation = self.generate(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(GenerationChunk {
                delta: Some(generation.text),
                done: true,
                usage: generation.usage,
            }))
            .await;
        Ok(rx)
    }

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, LlmError> {
        Ok(true)
    }
}
