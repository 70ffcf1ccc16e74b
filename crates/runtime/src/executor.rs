//! Agent executor — the facade the gateway drives.
//!
//! Owns the shared components (store, backend, tools, persona registry,
//! configuration) and constructs per-session runtimes and orchestrators.
//! Persona resolution happens through the registry keyed by role; agent
//! instances for built-in roles are created lazily on first use.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::sync::mpsc;

use devsquad_config::AppConfig;
use devsquad_core::llm::LlmBackend;
use devsquad_core::tool::ToolRegistry;
use devsquad_core::{AgentId, AgentInstance, PersonaRole, RuntimeError, RuntimeEvent, TaskId};
use devsquad_store::ProjectStore;

use crate::context::ContextAssembler;
use crate::orchestrator::TeamOrchestrator;
use crate::persona::PersonaRegistry;
use crate::task_runner::{AgentRuntime, ExecutionOutcome};

/// Shared wiring for agent execution and team conversations.
pub struct AgentExecutor {
    store: Arc<dyn ProjectStore>,
    backend: Arc<dyn LlmBackend>,
    tools: Arc<ToolRegistry>,
    personas: Arc<PersonaRegistry>,
    config: AppConfig,
}

impl AgentExecutor {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        backend: Arc<dyn LlmBackend>,
        tools: Arc<ToolRegistry>,
        personas: Arc<PersonaRegistry>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            backend,
            tools,
            personas,
            config,
        }
    }

    pub fn store(&self) -> Arc<dyn ProjectStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build a runtime bound to one session's event channel and
    /// cancellation flag.
    pub fn runtime(
        &self,
        events: mpsc::Sender<RuntimeEvent>,
        cancel: Arc<AtomicBool>,
    ) -> AgentRuntime {
        AgentRuntime::new(
            self.store.clone(),
            self.backend.clone(),
            self.tools.clone(),
            self.personas.clone(),
            ContextAssembler::new(self.config.runtime.context.clone()),
            self.config.llm.model.clone(),
            PathBuf::from(&self.config.workspace_root),
            events,
            cancel,
        )
        .with_max_response_tokens(self.config.llm.max_tokens)
    }

    /// Build a team conversation session bound to an event channel.
    pub fn team_session(&self, events: mpsc::Sender<RuntimeEvent>) -> TeamOrchestrator {
        TeamOrchestrator::new(
            self.backend.clone(),
            self.personas.clone(),
            self.config.orchestrator.clone(),
            self.config.llm.model.clone(),
            events,
        )
    }

    /// Find an idle instance of a built-in role, creating one lazily.
    pub async fn ensure_agent(&self, role: PersonaRole) -> Result<AgentId, RuntimeError> {
        let existing = self
            .store
            .agents()
            .await?
            .into_iter()
            .find(|a| a.persona == role);
        if let Some(agent) = existing {
            return Ok(agent.id);
        }

        let agent = AgentInstance::new(role, self.config.llm.model.clone());
        let id = agent.id.clone();
        self.store.insert_agent(agent).await?;
        Ok(id)
    }

    /// Execute a task with a given agent on a fresh runtime.
    pub async fn execute(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        events: mpsc::Sender<RuntimeEvent>,
        cancel: Arc<AtomicBool>,
    ) -> Result<ExecutionOutcome, RuntimeError> {
        self.runtime(events, cancel).execute_task(agent_id, task_id).await
    }
}
