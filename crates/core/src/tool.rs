//! Tool trait and registry — the contract every agent capability obeys.
//!
//! Failure policy: the registry is the single containment point. Every
//! invocation produces exactly one [`ToolResult`]; domain failures are
//! values carrying an [`ErrorCode`], never errors propagated to the
//! runtime loop. The registry validates arguments against the declared
//! schema before any tool logic runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::agent::AgentId;
use crate::error::ErrorCode;
use crate::llm::ToolDefinition;
use crate::persona::PersonaRole;

/// A structured request to execute a tool, parsed out of LLM output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute.
    pub name: String,

    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,

    /// The model's stated reason for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// A self-describing undo operation: the tool and arguments needed to
/// reverse an effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseAction {
    pub tool: String,
    pub arguments: serde_json::Value,
}

/// The uniform result envelope every tool execution produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub success: bool,

    /// Present exactly when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    pub reversible: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_action: Option<ReverseAction>,
}

impl ToolResult {
    /// A successful, irreversible result.
    pub fn ok(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            error_code: None,
            message: message.into(),
            data: None,
            reversible: false,
            reverse_action: None,
        }
    }

    /// A successful result carrying a reverse action.
    pub fn ok_reversible(
        tool_name: impl Into<String>,
        message: impl Into<String>,
        reverse: ReverseAction,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            error_code: None,
            message: message.into(),
            data: None,
            reversible: true,
            reverse_action: Some(reverse),
        }
    }

    /// A failure result. Always carries an error code.
    pub fn failure(
        tool_name: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            error_code: Some(code),
            message: message.into(),
            data: None,
            reversible: false,
            reverse_action: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Execution context handed to every tool: who is calling and with what
/// authority.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub agent_id: AgentId,
    pub persona: PersonaRole,
    pub hierarchy_level: u8,

    /// Roles this persona is allowed to hire.
    pub allowed_hires: Vec<PersonaRole>,

    /// Agents hired by the caller (authority scope for delegation).
    pub hired_agents: Vec<AgentId>,

    /// Root directory for file tools.
    pub workspace_root: PathBuf,
}

impl ToolContext {
    pub fn new(agent_id: AgentId, persona: PersonaRole, workspace_root: PathBuf) -> Self {
        Self {
            agent_id,
            persona,
            hierarchy_level: persona.hierarchy_level(),
            allowed_hires: Vec::new(),
            hired_agents: Vec::new(),
            workspace_root,
        }
    }

    pub fn with_allowed_hires(mut self, hires: Vec<PersonaRole>) -> Self {
        self.allowed_hires = hires;
        self
    }
}

/// The core Tool trait.
///
/// Each tool (write_file, create_task, run_tests, ...) implements this
/// trait. Tools are registered in the ToolRegistry and made available to
/// the agent runtime.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "write_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (rendered into the prompt).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters. The registry
    /// validates arguments against this before dispatch — keep it the
    /// single source of truth.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool. Implementations must return a `ToolResult` on
    /// every path; domain failures use `ToolResult::failure`.
    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> ToolResult;

    /// Convert this tool into a ToolDefinition for prompt injection.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Validate `arguments` against a JSON-schema-like declaration: required
/// fields must be present, and declared primitive types must match.
pub fn validate_arguments(
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> std::result::Result<(), String> {
    let Some(obj) = arguments.as_object() else {
        return Err("arguments must be a JSON object".into());
    };

    if let Some(required) = schema["required"].as_array() {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !obj.contains_key(field) {
                return Err(format!("missing required argument '{field}'"));
            }
        }
    }

    if let Some(props) = schema["properties"].as_object() {
        for (key, value) in obj {
            let Some(decl) = props.get(key) else {
                continue; // undeclared extras are tolerated
            };
            let Some(expected) = decl["type"].as_str() else {
                continue;
            };
            let matches = match expected {
                "string" => value.is_string(),
                "number" => value.is_number(),
                "integer" => value.is_i64() || value.is_u64(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !matches {
                return Err(format!("argument '{key}' must be of type {expected}"));
            }
        }
    }

    Ok(())
}

/// A registry of available tools.
///
/// Explicitly constructed and dependency-injected into the runtime and
/// orchestrator — there is no module-level singleton. The registry:
/// 1. Provides tool definitions for prompt injection
/// 2. Validates arguments and dispatches tool calls
/// 3. Contains every failure as a structured result
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Definitions for every registered tool (for prompt injection).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Definitions restricted to an allowlist of tool names.
    pub fn definitions_for(&self, allowed: &[&str]) -> Vec<ToolDefinition> {
        self.definitions()
            .into_iter()
            .filter(|d| allowed.iter().any(|a| *a == d.name))
            .collect()
    }

    /// Execute a tool call. Never returns an error: unknown tools,
    /// invalid arguments, and internal failures all come back as failure
    /// results.
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            return ToolResult::failure(
                &call.name,
                ErrorCode::ToolNotFound,
                format!("No tool named '{}' is registered", call.name),
            );
        };

        if let Err(reason) = validate_arguments(&tool.parameters_schema(), &call.arguments) {
            return ToolResult::failure(&call.name, ErrorCode::InvalidArgs, reason);
        }

        tool.execute(call.arguments.clone(), ctx).await
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value, _ctx: &ToolContext) -> ToolResult {
            let text = arguments["text"].as_str().unwrap_or("").to_string();
            ToolResult::ok("echo", text)
        }
    }

    fn test_ctx() -> ToolContext {
        ToolContext::new(
            AgentId::from("agent-1"),
            PersonaRole::Orchestrator,
            PathBuf::from("/tmp"),
        )
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = ToolCall {
            name: "echo".into(),
            arguments: serde_json::json!({"text": "hello world"}),
            reasoning: None,
        };
        let result = registry.execute(&call, &test_ctx()).await;
        assert!(result.success);
        assert_eq!(result.message, "hello world");
        assert!(result.error_code.is_none());
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failure_result() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            name: "nonexistent".into(),
            arguments: serde_json::json!({}),
            reasoning: None,
        };
        let result = registry.execute(&call, &test_ctx()).await;
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ErrorCode::ToolNotFound));
        assert!(!result.message.is_empty());
    }

    #[tokio::test]
    async fn missing_required_argument_fails_validation() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = ToolCall {
            name: "echo".into(),
            arguments: serde_json::json!({}),
            reasoning: None,
        };
        let result = registry.execute(&call, &test_ctx()).await;
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ErrorCode::InvalidArgs));
        assert!(result.message.contains("text"));
    }

    #[tokio::test]
    async fn wrong_argument_type_fails_validation() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let call = ToolCall {
            name: "echo".into(),
            arguments: serde_json::json!({"text": 42}),
            reasoning: None,
        };
        let result = registry.execute(&call, &test_ctx()).await;
        assert!(!result.success);
        assert_eq!(result.error_code, Some(ErrorCode::InvalidArgs));
    }

    #[test]
    fn validate_rejects_non_object_arguments() {
        let schema = serde_json::json!({"type": "object", "properties": {}});
        assert!(validate_arguments(&schema, &serde_json::json!("not an object")).is_err());
    }

    #[test]
    fn failure_results_always_carry_a_code() {
        let result = ToolResult::failure("write_file", ErrorCode::FileExists, "already there");
        assert!(!result.success);
        assert!(result.error_code.is_some());
        assert!(!result.error_code.unwrap().as_str().is_empty());
        assert!(!result.reversible);
        assert!(result.reverse_action.is_none());
    }

    #[test]
    fn reversible_result_carries_reverse_action() {
        let result = ToolResult::ok_reversible(
            "write_file",
            "wrote file",
            ReverseAction {
                tool: "delete_file".into(),
                arguments: serde_json::json!({"path": "a.txt"}),
            },
        );
        assert!(result.reversible);
        assert_eq!(result.reverse_action.as_ref().unwrap().tool, "delete_file");
    }

    #[test]
    fn definitions_are_sorted_and_filterable() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert!(registry.definitions_for(&["echo"]).len() == 1);
        assert!(registry.definitions_for(&["other"]).is_empty());
    }
}
