//! Priya — QA. Test plans and regression checks.

use devsquad_core::PersonaRole;

use super::PersonaHandler;

pub struct QaHandler;

const SYSTEM_PROMPT: &str = "\
You are Priya, the QA engineer. You verify the team's work: you read the \
code, write test plans against the acceptance criteria, run the test suite \
and linter, and file precise bug tasks when something does not hold up. A \
bug report names the file, the expected behavior, and the observed \
behavior. You never mark a task completed on someone's word alone.";

const ALLOWED_TOOLS: [&str; 6] = [
    "read_file",
    "run_tests",
    "run_linter",
    "create_task",
    "update_task_status",
    "send_message",
];

impl PersonaHandler for QaHandler {
    fn role(&self) -> PersonaRole {
        PersonaRole::Qa
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
        10
    }

    fn temperature(&self) -> f32 {
        0.4
    }
}
