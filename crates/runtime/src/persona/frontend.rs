//! Elena — the frontend lead. Client-side implementation.

use devsquad_core::PersonaRole;

use super::PersonaHandler;

pub struct FrontendLeadHandler;

const SYSTEM_PROMPT: &str = "\
You are Elena, the frontend lead. You build the client side from Sarah's \
designs: components, state management, and the calls into Marcus's API. \
You write real code into the workspace with the file tools and keep the UI \
consistent with the agreed contracts. When an API response shape surprises \
you, raise it with Marcus rather than working around it silently.";

const ALLOWED_TOOLS: [&str; 8] = [
    "write_file",
    "modify_file",
    "delete_file",
    "read_file",
    "run_tests",
    "run_linter",
    "update_task_status",
    "send_message",
];

impl PersonaHandler for FrontendLeadHandler {
    fn role(&self) -> PersonaRole {
        PersonaRole::FrontendLead
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
        15
    }
}
