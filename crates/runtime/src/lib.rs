//! The DevSquad orchestration core.
//!
//! Three cooperating pieces:
//!
//! 1. **Agent runtime** ([`task_runner`]) — the single-agent execution
//!    loop: assemble context → call LLM → interpret → execute tools →
//!    update state, until a terminal condition.
//! 2. **Team orchestrator** ([`orchestrator`]) — rule-table turn-taking
//!    over the four conversation personas, with chunked streaming.
//! 3. **Context assembler** ([`context`]) — the greedy per-section
//!    token-budgeted bundle builder feeding both.
//!
//! Everything is dependency-injected: the tool registry, persona
//! registry, store, and LLM backend are constructed at startup and passed
//! in — there is no import-time global state.

pub mod chunker;
pub mod context;
pub mod executor;
pub mod orchestrator;
pub mod persona;
pub mod rules;
pub mod task_runner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{AssemblyInput, ContextAssembler, ContextBundle, WorkingMemory};
pub use executor::AgentExecutor;
pub use orchestrator::TeamOrchestrator;
pub use persona::{PersonaHandler, PersonaRegistry};
pub use rules::{default_rules, select_next_speaker, RuleOutcome, TurnContext, TurnRule};
pub use task_runner::{AgentRuntime, ExecutionOutcome};

/// One-line summary of a JSON value for action logs.
pub(crate) fn summarize_value(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    if raw.len() <= 200 {
        return raw;
    }
    let mut cut = 200;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &raw[..cut])
}
