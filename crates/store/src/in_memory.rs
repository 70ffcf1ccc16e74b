//! In-memory store — RwLock-guarded maps.
//!
//! Zero persistence. Used for tests and as a lightweight default when no
//! database is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use devsquad_core::{
    ActionRecord, AgentId, AgentInstance, AgentStatus, ApiContract, Artifact, Checkpoint, Decision,
    MemoryNote, ProjectManifest, StatusChange, StoreError, Task, TaskId, TaskStatus,
};

use crate::{apply_status, ProjectStore};

/// A fully in-memory `ProjectStore`.
#[derive(Default)]
pub struct InMemoryStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    status_log: RwLock<Vec<StatusChange>>,
    agents: RwLock<HashMap<AgentId, AgentInstance>>,
    actions: RwLock<Vec<ActionRecord>>,
    checkpoints: RwLock<Vec<Checkpoint>>,
    artifacts: RwLock<HashMap<String, Artifact>>,
    decisions: RwLock<Vec<Decision>>,
    contracts: RwLock<Vec<ApiContract>>,
    memory_notes: RwLock<Vec<MemoryNote>>,
    project: RwLock<Option<ProjectManifest>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn insert_task(&self, task: Task) -> Result<(), StoreError> {
        self.tasks.write().await.insert(task.id.clone(), task);
        Ok(())
    }

    async fn task(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))
    }

    async fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&task.id) {
            return Err(StoreError::TaskNotFound(task.id.to_string()));
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn set_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        let change = apply_status(task, status)?;
        let updated = task.clone();
        drop(tasks);
        self.status_log.write().await.push(change);
        Ok(updated)
    }

    async fn status_changes(&self, id: &TaskId) -> Result<Vec<StatusChange>, StoreError> {
        Ok(self
            .status_log
            .read()
            .await
            .iter()
            .filter(|c| &c.task_id == id)
            .cloned()
            .collect())
    }

    async fn insert_agent(&self, agent: AgentInstance) -> Result<(), StoreError> {
        self.agents.write().await.insert(agent.id.clone(), agent);
        Ok(())
    }

    async fn agent(&self, id: &AgentId) -> Result<AgentInstance, StoreError> {
        self.agents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AgentNotFound(id.to_string()))
    }

    async fn update_agent(&self, agent: &AgentInstance) -> Result<(), StoreError> {
        let mut agents = self.agents.write().await;
        if !agents.contains_key(&agent.id) {
            return Err(StoreError::AgentNotFound(agent.id.to_string()));
        }
        agents.insert(agent.id.clone(), agent.clone());
        Ok(())
    }

    async fn set_agent_status(&self, id: &AgentId, status: AgentStatus) -> Result<(), StoreError> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| StoreError::AgentNotFound(id.to_string()))?;
        agent.status = status;
        agent.updated_at = Utc::now();
        Ok(())
    }

    async fn agents(&self) -> Result<Vec<AgentInstance>, StoreError> {
        let mut all: Vec<_> = self.agents.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn append_action(&self, record: ActionRecord) -> Result<(), StoreError> {
        self.actions.write().await.push(record);
        Ok(())
    }

    async fn recent_actions(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ActionRecord>, StoreError> {
        let actions = self.actions.read().await;
        let mut recent: Vec<_> = actions
            .iter()
            .filter(|a| a.timestamp >= since)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn write_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StoreError> {
        self.checkpoints.write().await.push(checkpoint);
        Ok(())
    }

    async fn checkpoint_count(&self, agent_id: &AgentId) -> Result<usize, StoreError> {
        Ok(self
            .checkpoints
            .read()
            .await
            .iter()
            .filter(|c| &c.agent_id == agent_id)
            .count())
    }

    async fn artifact(&self, path: &str) -> Result<Option<Artifact>, StoreError> {
        Ok(self.artifacts.read().await.get(path).cloned())
    }

    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError> {
        self.artifacts
            .write()
            .await
            .insert(artifact.path.clone(), artifact);
        Ok(())
    }

    async fn remove_artifact(&self, path: &str) -> Result<(), StoreError> {
        self.artifacts.write().await.remove(path);
        Ok(())
    }

    async fn artifacts(&self) -> Result<Vec<Artifact>, StoreError> {
        let mut all: Vec<_> = self.artifacts.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn add_decision(&self, decision: Decision) -> Result<(), StoreError> {
        self.decisions.write().await.push(decision);
        Ok(())
    }

    async fn recent_decisions(&self, limit: usize) -> Result<Vec<Decision>, StoreError> {
        let decisions = self.decisions.read().await;
        let mut recent: Vec<_> = decisions.iter().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn api_contracts(&self) -> Result<Vec<ApiContract>, StoreError> {
        Ok(self.contracts.read().await.clone())
    }

    async fn add_api_contract(&self, contract: ApiContract) -> Result<(), StoreError> {
        self.contracts.write().await.push(contract);
        Ok(())
    }

    async fn add_memory(&self, memory: MemoryNote) -> Result<(), StoreError> {
        self.memory_notes.write().await.push(memory);
        Ok(())
    }

    async fn memories(&self, limit: usize) -> Result<Vec<MemoryNote>, StoreError> {
        let notes = self.memory_notes.read().await;
        let mut ranked: Vec<_> = notes.iter().cloned().collect();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn manifest(&self) -> Result<Option<ProjectManifest>, StoreError> {
        Ok(self.project.read().await.clone())
    }

    async fn set_manifest(&self, manifest: ProjectManifest) -> Result<(), StoreError> {
        *self.project.write().await = Some(manifest);
        Ok(())
    }
}
