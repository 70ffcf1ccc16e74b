//! Persistence backends for DevSquad project state.
//!
//! The `ProjectStore` trait is the only shared resource in the system. All
//! mutations are simple single-row writes with no transactions spanning
//! multiple steps of the runtime loop — a crash between a tool call and
//! the following status update can leave a task `in_progress`. That
//! partial-failure window is inherited from the product design and is
//! documented rather than papered over.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use devsquad_core::{
    ActionRecord, AgentId, AgentInstance, AgentStatus, ApiContract, Artifact, Checkpoint, Decision,
    MemoryNote, ProjectManifest, StatusChange, StoreError, Task, TaskId, TaskStatus,
};

/// The persistence boundary for all project state.
///
/// The orchestration core borrows tasks/agents for the duration of an
/// iteration; it never owns their lifecycle.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    // ── Tasks ──

    async fn insert_task(&self, task: Task) -> Result<(), StoreError>;

    async fn task(&self, id: &TaskId) -> Result<Task, StoreError>;

    /// Overwrite a task record (single-row write).
    async fn update_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Validate and apply a status transition, appending one entry to the
    /// status-change log per call (re-applying the same status is legal
    /// and still logs exactly one entry).
    async fn set_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError>;

    async fn status_changes(&self, id: &TaskId) -> Result<Vec<StatusChange>, StoreError>;

    // ── Agents ──

    async fn insert_agent(&self, agent: AgentInstance) -> Result<(), StoreError>;

    async fn agent(&self, id: &AgentId) -> Result<AgentInstance, StoreError>;

    async fn update_agent(&self, agent: &AgentInstance) -> Result<(), StoreError>;

    async fn set_agent_status(&self, id: &AgentId, status: AgentStatus) -> Result<(), StoreError>;

    async fn agents(&self) -> Result<Vec<AgentInstance>, StoreError>;

    // ── Action log ──

    async fn append_action(&self, record: ActionRecord) -> Result<(), StoreError>;

    /// Most-recent actions since `since`, newest first, capped at `limit`.
    async fn recent_actions(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ActionRecord>, StoreError>;

    // ── Checkpoints (write-only from the core's perspective) ──

    async fn write_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StoreError>;

    /// Number of checkpoints written for an agent (observability/tests).
    async fn checkpoint_count(&self, agent_id: &AgentId) -> Result<usize, StoreError>;

    // ── Artifacts (file version records) ──

    async fn artifact(&self, path: &str) -> Result<Option<Artifact>, StoreError>;

    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError>;

    async fn remove_artifact(&self, path: &str) -> Result<(), StoreError>;

    /// All artifacts, most-recently-updated first.
    async fn artifacts(&self) -> Result<Vec<Artifact>, StoreError>;

    // ── Context records ──

    async fn add_decision(&self, decision: Decision) -> Result<(), StoreError>;

    /// Most-recent decisions, newest first, capped at `limit`.
    async fn recent_decisions(&self, limit: usize) -> Result<Vec<Decision>, StoreError>;

    async fn api_contracts(&self) -> Result<Vec<ApiContract>, StoreError>;

    async fn add_api_contract(&self, contract: ApiContract) -> Result<(), StoreError>;

    async fn add_memory(&self, memory: MemoryNote) -> Result<(), StoreError>;

    /// Top memories by importance (then recency), capped at `limit`.
    async fn memories(&self, limit: usize) -> Result<Vec<MemoryNote>, StoreError>;

    async fn manifest(&self) -> Result<Option<ProjectManifest>, StoreError>;

    async fn set_manifest(&self, manifest: ProjectManifest) -> Result<(), StoreError>;
}

/// Shared transition logic used by both backends.
pub(crate) fn apply_status(task: &mut Task, status: TaskStatus) -> Result<StatusChange, StoreError> {
    if !task.status.can_transition(status) {
        return Err(StoreError::InvalidTransition {
            from: task.status.as_str().into(),
            to: status.as_str().into(),
        });
    }
    let change = StatusChange {
        task_id: task.id.clone(),
        from: task.status,
        to: status,
        changed_at: Utc::now(),
    };
    task.status = status;
    task.updated_at = change.changed_at;
    Ok(change)
}
