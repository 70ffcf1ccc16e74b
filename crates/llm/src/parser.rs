//! Response parsing — turns raw LLM text into structured runtime input.
//!
//! The backend has no native function calling, so everything rides in the
//! text by convention:
//!
//! - `<think>...</think>` (or `<thinking>...</thinking>`) — reasoning,
//!   extracted and removed from the visible content
//! - fenced ```` ```tool_call ```` or ```` ```json ```` blocks containing
//!   `{"tool": ..., "arguments": ..., "reasoning": ...}` — tool calls
//! - `[NEEDS_USER_INPUT]` — the agent wants input before continuing
//! - `[BLOCKED: reason]` — the agent declares itself blocked
//!
//! Tie-break rule: `is_final` is false whenever any tool call block was
//! found, even if the response also reads like a final answer.

use devsquad_core::tool::ToolCall;
use regex::Regex;
use std::sync::OnceLock;

/// A parsed LLM response.
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    /// Extracted reasoning text, if any.
    pub thinking: Option<String>,

    /// The visible content with thinking, tool blocks, and markers removed.
    pub content: String,

    /// Tool calls, in the order they appeared.
    pub tool_calls: Vec<ToolCall>,

    /// The agent asked for user input.
    pub needs_input: bool,

    /// The agent declared itself blocked, with this reason.
    pub blocked_reason: Option<String>,

    /// False whenever any tool call was parsed.
    pub is_final: bool,
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:tool_call|json)[ \t]*\n(.*?)```").unwrap())
}

fn blocked_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[BLOCKED:\s*([^\]]*)\]").unwrap())
}

fn needs_input_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\[NEEDS_USER_INPUT\]").unwrap())
}

/// Parse a raw LLM response into its structured parts.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let (without_thinking, thinking) = extract_thinking(raw);

    // Extract tool calls from fenced blocks. A ```json block only counts
    // as a tool call if it decodes to an object with a string "tool"
    // field — other json blocks (schemas, examples) stay in the content.
    let mut tool_calls = Vec::new();
    let mut content = String::with_capacity(without_thinking.len());
    let mut last_end = 0;

    for caps in fence_re().captures_iter(&without_thinking) {
        let whole = caps.get(0).unwrap();
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

        match parse_tool_call(body) {
            Some(call) => {
                tool_calls.push(call);
                content.push_str(&without_thinking[last_end..whole.start()]);
                last_end = whole.end();
            }
            None => {
                // Not a tool call — keep the block verbatim.
            }
        }
    }
    content.push_str(&without_thinking[last_end..]);

    // Control markers
    let needs_input = needs_input_re().is_match(&content);
    let blocked_reason = blocked_re()
        .captures(&content)
        .map(|c| c[1].trim().to_string());

    let content = needs_input_re().replace_all(&content, "");
    let content = blocked_re().replace_all(&content, "").trim().to_string();

    let is_final = tool_calls.is_empty();

    ParsedResponse {
        thinking,
        content,
        tool_calls,
        needs_input,
        blocked_reason,
        is_final,
    }
}

/// Try to decode a fenced block body as a tool call.
fn parse_tool_call(body: &str) -> Option<ToolCall> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let obj = value.as_object()?;
    let tool = obj.get("tool")?.as_str()?.to_string();
    let arguments = obj
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    let reasoning = obj
        .get("reasoning")
        .and_then(|r| r.as_str())
        .map(String::from);
    Some(ToolCall {
        name: tool,
        arguments,
        reasoning,
    })
}

/// Remove `<think>`/`<thinking>` blocks, returning the stripped text and
/// the collected thinking. An unterminated block swallows the rest of the
/// text (the model was cut off mid-thought).
fn extract_thinking(input: &str) -> (String, Option<String>) {
    let mut output = input.to_string();
    let mut thinking = String::new();

    for (start, end) in [("<think>", "</think>"), ("<thinking>", "</thinking>")] {
        while let Some(start_idx) = output.find(start) {
            let inner_start = start_idx + start.len();
            match output[inner_start..].find(end) {
                Some(relative_end) => {
                    let inner_end = inner_start + relative_end;
                    if !thinking.is_empty() {
                        thinking.push('\n');
                    }
                    thinking.push_str(output[inner_start..inner_end].trim());
                    output.replace_range(start_idx..inner_end + end.len(), "");
                }
                None => {
                    if !thinking.is_empty() {
                        thinking.push('\n');
                    }
                    thinking.push_str(output[inner_start..].trim());
                    output.truncate(start_idx);
                    break;
                }
            }
        }
    }

    let thinking = if thinking.is_empty() {
        None
    } else {
        Some(thinking)
    };
    (output, thinking)
}
