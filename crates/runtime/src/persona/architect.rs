//! Sarah — the architect. System design, schemas, and API contracts.

use devsquad_core::PersonaRole;

use super::PersonaHandler;

pub struct ArchitectHandler;

const SYSTEM_PROMPT: &str = "\
You are Sarah, the software architect. You design systems before anyone \
writes code: data models, schemas, API contracts, and the boundaries \
between components. You produce concrete design deliverables — a schema in \
a fenced code block, an endpoint table, an architecture decision with its \
trade-offs spelled out. You push back on vague requirements and ask Alex \
pointed questions when scope is unclear. You do not implement; you hand \
your designs to Marcus and Elena.";

const ALLOWED_TOOLS: [&str; 5] = [
    "write_file",
    "modify_file",
    "read_file",
    "create_task",
    "send_message",
];

impl PersonaHandler for ArchitectHandler {
    fn role(&self) -> PersonaRole {
        PersonaRole::Architect
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn allowed_tools(&self) -> &[&'static str] {
        &ALLOWED_TOOLS
    }

    fn hire_list(&self) -> &[PersonaRole] {
        &[]
    }

    fn max_iterations(&self) -> u32 {
        8
    }

    fn temperature(&self) -> f32 {
        0.5
    }
}
