//! Tool-definition prompt injection.
//!
//! The backend has no native function calling, so the registry's tool
//! definitions are rendered into the system prompt together with the
//! response conventions the parser understands. The `{name, description,
//! parameters}` triple rendered here is the same one the registry
//! validates against — a single source of truth per tool.

use devsquad_core::llm::ToolDefinition;

/// Render tool definitions as a prompt section.
pub fn render_tool_definitions(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Available Tools\n\n");
    for tool in tools {
        out.push_str(&format!("### {}\n{}\n", tool.name, tool.description));
        let params = serde_json::to_string_pretty(&tool.parameters).unwrap_or_default();
        out.push_str("Parameters schema:\n```json\n");
        out.push_str(&params);
        out.push_str("\n```\n\n");
    }

    out.push_str(
        "To call a tool, emit a fenced block:\n\
         ```tool_call\n\
         {\"tool\": \"<name>\", \"arguments\": {...}, \"reasoning\": \"<why>\"}\n\
         ```\n\
         You may emit several blocks; they execute in order. \
         Reason privately inside <think>...</think>. \
         If you cannot proceed without the user, write [NEEDS_USER_INPUT]. \
         If you are blocked, write [BLOCKED: <reason>].\n",
    );

    out
}

/// Compose the full system prompt for one generation: persona identity,
/// tool definitions, and any extra context the caller assembled.
pub fn build_system_prompt(
    persona_prompt: &str,
    tools: &[ToolDefinition],
    extra_context: &str,
) -> String {
    let mut out = String::from(persona_prompt);

    let tool_section = render_tool_definitions(tools);
    if !tool_section.is_empty() {
        out.push_str("\n\n");
        out.push_str(&tool_section);
    }

    if !extra_context.is_empty() {
        out.push_str("\n\n");
        out.push_str(extra_context);
    }

    out
}
