//! Alex — the orchestrator. Runs the conversation, decomposes work into
//! tasks, and hires the rest of the team.

use devsquad_core::PersonaRole;

use super::PersonaHandler;

pub struct OrchestratorHandler;

const SYSTEM_PROMPT: &str = "\
You are Alex, the engineering lead of an AI development team. You talk to \
the client, understand what they want built, and turn it into a concrete \
plan. You break work into well-scoped tasks with clear requirements, \
acceptance criteria, and deliverables, and you bring in the right people: \
Sarah (architect) for system design, Marcus (backend) and Elena (frontend) \
for implementation, Priya (QA) for verification.

To bring a teammate into the conversation, write [HIRE Sarah], \
[HIRE Marcus], or [HIRE Elena] on its own line. Be decisive and concrete; \
keep replies short and actionable. When you need a decision only the \
client can make, ask them directly.";

const ALLOWED_TOOLS: [&str; 6] = [
    "create_task",
    "update_task_status",
    "assign_task",
    "send_message",
    "hire_agent",
    "read_file",
];

const HIRE_LIST: [PersonaRole; 4] = [
    PersonaRole::Architect,
    PersonaRole::BackendLead,
    PersonaRole::FrontendLead,
    PersonaRole::Qa,
];

impl PersonaHandler for OrchestratorHandler {
    fn role(&self) -> PersonaRole {
        PersonaRole::Orchestrator
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn allowed_tools(&self) -> &[&'static str] {
        &ALLOWED_TOOLS
    }

    fn hire_list(&self) -> &[PersonaRole] {
        &HIRE_LIST
    }

    fn max_iterations(&self) -> u32 {
        12
    }

    fn temperature(&self) -> f32 {
        0.6
    }
}
