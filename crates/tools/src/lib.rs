//! Built-in tool implementations for DevSquad agents.
//!
//! Tools give personas the ability to act on the project: create and
//! modify files, manage tasks, message teammates, hire agents, and run
//! tests/linters. Every tool obeys the contract in `devsquad_core::tool`:
//! arguments are schema-validated before execution, every invocation
//! yields exactly one `ToolResult`, and reversible effects carry a
//! self-describing reverse action.

pub mod assign_task;
pub mod create_task;
pub mod delete_file;
pub mod hire_agent;
pub mod modify_file;
pub mod read_file;
pub mod run_linter;
pub mod send_message;
pub mod update_task_status;
pub mod write_file;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use devsquad_core::tool::ToolRegistry;
use devsquad_store::ProjectStore;

/// Create the default tool registry with all built-in tools.
///
/// The registry is explicitly constructed and injected into the runtime —
/// its lifetime is scoped to the serving process, not import time.
pub fn default_registry(store: Arc<dyn ProjectStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(write_file::WriteFileTool::new(store.clone())));
    registry.register(Box::new(modify_file::ModifyFileTool::new(store.clone())));
    registry.register(Box::new(delete_file::DeleteFileTool::new(store.clone())));
    registry.register(Box::new(read_file::ReadFileTool::new()));
    registry.register(Box::new(create_task::CreateTaskTool::new(store.clone())));
    registry.register(Box::new(update_task_status::UpdateTaskStatusTool::new(
        store.clone(),
    )));
    registry.register(Box::new(assign_task::AssignTaskTool::new(store.clone())));
    registry.register(Box::new(send_message::SendMessageTool::new(store.clone())));
    registry.register(Box::new(hire_agent::HireAgentTool::new(store)));
    registry.register(Box::new(run_tests::RunTestsTool::default()));
    registry.register(Box::new(run_linter::RunLinterTool::default()));
    registry
}

/// Resolve a workspace-relative path, rejecting absolute paths and parent
/// traversal. Returns the absolute on-disk path.
pub(crate) fn resolve_workspace_path(root: &Path, path: &str) -> Result<PathBuf, String> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Err(format!("Path must be workspace-relative: {path}"));
    }
    for component in candidate.components() {
        if matches!(component, Component::ParentDir) {
            return Err(format!("Path must not traverse above the workspace: {path}"));
        }
    }
    Ok(root.join(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use devsquad_store::InMemoryStore;

    #[test]
    fn default_registry_registers_all_tools() {
        let registry = default_registry(Arc::new(InMemoryStore::new()));
        let names = registry.names();
        for expected in [
            "assign_task",
            "create_task",
            "delete_file",
            "hire_agent",
            "modify_file",
            "read_file",
            "run_linter",
            "run_tests",
            "send_message",
            "update_task_status",
            "write_file",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn workspace_path_rejects_absolute() {
        let err = resolve_workspace_path(Path::new("/ws"), "/etc/passwd").unwrap_err();
        assert!(err.contains("workspace-relative"));
    }

    #[test]
    fn workspace_path_rejects_traversal() {
        let err = resolve_workspace_path(Path::new("/ws"), "../secrets.txt").unwrap_err();
        assert!(err.contains("traverse"));
    }

    #[test]
    fn workspace_path_joins_relative() {
        let path = resolve_workspace_path(Path::new("/ws"), "src/main.rs").unwrap();
        assert_eq!(path, PathBuf::from("/ws/src/main.rs"));
    }
}
