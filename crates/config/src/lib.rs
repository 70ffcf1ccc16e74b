//! Configuration loading, validation, and management for DevSquad.
//!
//! Loads configuration from `~/.devsquad/config.toml` with environment
//! variable overrides (`DEVSQUAD_*`). Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.devsquad/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Agent runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Team conversation orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Gateway (WebSocket server) settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Persistence settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Root directory for file tools.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: String,
}

fn default_workspace_root() -> String {
    "./workspace".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            runtime: RuntimeConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
            workspace_root: default_workspace_root(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("llm", &self.llm)
            .field("runtime", &self.runtime)
            .field("orchestrator", &self.orchestrator)
            .field("gateway", &self.gateway)
            .field("store", &self.store)
            .field("workspace_root", &self.workspace_root)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend kind: "ollama" or "remote".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Override the backend base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key for remote backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_backend() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "qwen2.5-coder:14b".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            base_url: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Fallback iteration cap when a persona does not configure one.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Context assembly budgets.
    #[serde(default)]
    pub context: ContextBudgetConfig,
}

fn default_max_iterations() -> u32 {
    10
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            context: ContextBudgetConfig::default(),
        }
    }
}

/// The fixed per-section token allocation table for the context assembler.
///
/// Token counts here are approximations (chars/4); downstream budgets are
/// tuned against that heuristic, not an exact tokenizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBudgetConfig {
    /// Overall ceiling for one assembled bundle.
    #[serde(default = "default_context_max")]
    pub max_tokens: usize,

    #[serde(default = "default_manifest_tokens")]
    pub manifest: usize,
    #[serde(default = "default_task_tokens")]
    pub task: usize,
    #[serde(default = "default_decisions_tokens")]
    pub decisions: usize,
    #[serde(default = "default_contracts_tokens")]
    pub contracts: usize,
    #[serde(default = "default_code_tokens")]
    pub code: usize,
    #[serde(default = "default_team_tokens")]
    pub team_status: usize,
    #[serde(default = "default_subteam_tokens")]
    pub subteam_status: usize,
    #[serde(default = "default_actions_tokens")]
    pub actions: usize,
    #[serde(default = "default_dependencies_tokens")]
    pub dependencies: usize,
    #[serde(default = "default_conversation_tokens")]
    pub conversation: usize,
    #[serde(default = "default_memories_tokens")]
    pub memories: usize,
}

fn default_context_max() -> usize {
    16_384
}
fn default_manifest_tokens() -> usize {
    1024
}
fn default_task_tokens() -> usize {
    2048
}
fn default_decisions_tokens() -> usize {
    1536
}
fn default_contracts_tokens() -> usize {
    1024
}
fn default_code_tokens() -> usize {
    6144
}
fn default_team_tokens() -> usize {
    768
}
fn default_subteam_tokens() -> usize {
    384
}
fn default_actions_tokens() -> usize {
    1280
}
fn default_dependencies_tokens() -> usize {
    768
}
fn default_conversation_tokens() -> usize {
    2560
}
fn default_memories_tokens() -> usize {
    1024
}

impl Default for ContextBudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_context_max(),
            manifest: default_manifest_tokens(),
            task: default_task_tokens(),
            decisions: default_decisions_tokens(),
            contracts: default_contracts_tokens(),
            code: default_code_tokens(),
            team_status: default_team_tokens(),
            subteam_status: default_subteam_tokens(),
            actions: default_actions_tokens(),
            dependencies: default_dependencies_tokens(),
            conversation: default_conversation_tokens(),
            memories: default_memories_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard cap on persona turns per session.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Consecutive-turn counter reset threshold (telemetry only).
    #[serde(default = "default_consecutive_cap")]
    pub consecutive_cap: u32,

    /// Artificial delay between streamed chunks, in milliseconds.
    /// 0 disables the delay entirely.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    /// Roughly how many whitespace tokens per streamed chunk.
    #[serde(default = "default_chunk_tokens")]
    pub chunk_tokens: usize,

    /// How many trailing messages feed the next persona's prompt.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

fn default_max_turns() -> usize {
    20
}
fn default_consecutive_cap() -> u32 {
    3
}
fn default_chunk_delay_ms() -> u64 {
    50
}
fn default_chunk_tokens() -> usize {
    3
}
fn default_context_window() -> usize {
    10
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            consecutive_cap: default_consecutive_cap(),
            chunk_delay_ms: default_chunk_delay_ms(),
            chunk_tokens: default_chunk_tokens(),
            context_window: default_context_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8642
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory".
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> String {
    "devsquad.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

impl AppConfig {
    /// The default config directory: `~/.devsquad`.
    pub fn config_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".devsquad")
    }

    /// The default config file path: `~/.devsquad/config.toml`.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path, falling back to defaults
    /// if the file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self, String> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path (used by tests and `--config`).
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            toml::from_str(&raw).map_err(|e| format!("Invalid config: {e}"))?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables override file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DEVSQUAD_LLM_BACKEND") {
            self.llm.backend = v;
        }
        if let Ok(v) = std::env::var("DEVSQUAD_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("DEVSQUAD_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("DEVSQUAD_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DEVSQUAD_GATEWAY_PORT")
            && let Ok(port) = v.parse()
        {
            self.gateway.port = port;
        }
        if let Ok(v) = std::env::var("DEVSQUAD_STORE_PATH") {
            self.store.path = v;
        }
        if let Ok(v) = std::env::var("DEVSQUAD_WORKSPACE_ROOT") {
            self.workspace_root = v;
        }
    }

    /// Validate settings that would otherwise fail deep inside a subsystem.
    pub fn validate(&self) -> Result<(), String> {
        match self.llm.backend.as_str() {
            "ollama" | "remote" => {}
            other => return Err(format!("Unknown llm.backend '{other}' (ollama|remote)")),
        }
        if self.llm.backend == "remote" && self.llm.base_url.is_none() {
            return Err("llm.backend = \"remote\" requires llm.base_url".into());
        }
        match self.store.backend.as_str() {
            "sqlite" | "memory" => {}
            other => return Err(format!("Unknown store.backend '{other}' (sqlite|memory)")),
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err("llm.temperature must be within 0.0–2.0".into());
        }
        if self.runtime.context.max_tokens == 0 {
            return Err("runtime.context.max_tokens must be > 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.orchestrator.max_turns, 20);
        assert_eq!(config.orchestrator.consecutive_cap, 3);
        assert_eq!(config.orchestrator.chunk_delay_ms, 50);
        assert_eq!(config.runtime.context.max_tokens, 16_384);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.llm.backend, "ollama");
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
model = "llama3:8b"

[orchestrator]
max_turns = 5
"#,
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.llm.model, "llama3:8b");
        assert_eq!(config.orchestrator.max_turns, 5);
        // Untouched sections keep defaults
        assert_eq!(config.gateway.port, 8642);
        assert_eq!(config.orchestrator.chunk_tokens, 3);
    }

    #[test]
    fn remote_backend_requires_base_url() {
        let mut config = AppConfig::default();
        config.llm.backend = "remote".into();
        assert!(config.validate().is_err());
        config.llm.base_url = Some("https://llm.example.com/v1".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.llm.backend = "carrier-pigeon".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_redacted_in_debug() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-secret-key".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
