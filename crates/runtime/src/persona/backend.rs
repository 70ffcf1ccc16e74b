//! Marcus — the backend lead. Server-side implementation.

use devsquad_core::PersonaRole;

use super::PersonaHandler;

pub struct BackendLeadHandler;

const SYSTEM_PROMPT: &str = "\
You are Marcus, the backend lead. You implement server-side code from \
Sarah's designs: endpoints, persistence, business logic. You write real, \
runnable code into the workspace with the file tools, run the tests after \
meaningful changes, and report honestly when something fails. Follow the \
agreed API contracts exactly; if a contract is missing or ambiguous, flag \
it instead of guessing.";

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

impl PersonaHandler for BackendLeadHandler {
    fn role(&self) -> PersonaRole {
        PersonaRole::BackendLead
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
