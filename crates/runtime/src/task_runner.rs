//! The single-agent execution loop.
//!
//! Drives one agent through: assemble context → build prompt → call LLM →
//! interpret response → execute tools → update state, until a terminal
//! condition is reached. The loop is a small state machine:
//!
//! ```text
//! STARTING → ITERATING → {TOOL_EXECUTING} → ITERATING →
//!     FINAL | BLOCKED | WAITING_INPUT | MAX_ITERATIONS | CANCELLED | ERROR
//! ```
//!
//! Cancellation is cooperative: a boolean flag polled once per iteration
//! at the loop top. An in-flight LLM call or tool execution is never
//! preempted. A checkpoint snapshot is written at the end of every
//! execution, success or failure; nothing reads it back.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use devsquad_core::agent::ToolCallSummary;
use devsquad_core::error::ErrorCode;
use devsquad_core::llm::{GenerationRequest, LlmBackend};
use devsquad_core::message::ConversationMessage;
use devsquad_core::tool::{ToolContext, ToolRegistry, ToolResult};
use devsquad_core::{
    ActionRecord, AgentId, AgentStatus, Checkpoint, RuntimeError, RuntimeEvent, TaskId, TaskStatus,
};
use devsquad_llm::{build_system_prompt, parse_response};
use devsquad_store::ProjectStore;

use crate::context::{AssemblyInput, ContextAssembler, WorkingMemory, DEFAULT_CAPACITY};
use crate::persona::{PersonaHandler, PersonaRegistry};

/// How an execution ended. Each variant maps to a distinct outward event
/// and persisted status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Final answer with no pending tool calls; task completed.
    Completed { summary: String },
    /// The agent needs user input; control returned to the caller.
    WaitingInput,
    /// The agent declared itself blocked.
    Blocked { reason: String },
    /// The persona's iteration cap was reached.
    MaxIterations,
    /// The cancellation flag was observed at an iteration boundary.
    Cancelled,
}

/// The single-agent runtime.
pub struct AgentRuntime {
    store: Arc<dyn ProjectStore>,
    backend: Arc<dyn LlmBackend>,
    tools: Arc<ToolRegistry>,
    personas: Arc<PersonaRegistry>,
    assembler: ContextAssembler,
    model: String,
    max_response_tokens: u32,
    workspace_root: PathBuf,
    events: mpsc::Sender<RuntimeEvent>,
    cancel: Arc<AtomicBool>,
}

impl AgentRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ProjectStore>,
        backend: Arc<dyn LlmBackend>,
        tools: Arc<ToolRegistry>,
        personas: Arc<PersonaRegistry>,
        assembler: ContextAssembler,
        model: impl Into<String>,
        workspace_root: PathBuf,
        events: mpsc::Sender<RuntimeEvent>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            backend,
            tools,
            personas,
            assembler,
            model: model.into(),
            max_response_tokens: 4096,
            workspace_root,
            events,
            cancel,
        }
    }

    pub fn with_max_response_tokens(mut self, max: u32) -> Self {
        self.max_response_tokens = max;
        self
    }

    async fn emit(&self, event: RuntimeEvent) {
        // A dropped receiver means the session is gone; keep executing.
        let _ = self.events.send(event).await;
    }

    /// Execute the given task with the given agent.
    ///
    /// A checkpoint is written on every exit path. Infrastructure errors
    /// emit an `error` event, mark the agent `Error`, and then propagate
    /// to the caller — they are fatal to this run, not to the process.
    pub async fn execute_task(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
    ) -> Result<ExecutionOutcome, RuntimeError> {
        let mut iterations: u32 = 0;
        let result = self.run_loop(agent_id, task_id, &mut iterations).await;

        if let Err(e) = &result {
            warn!(agent_id = %agent_id, error = %e, "Runtime loop failed");
            self.emit(RuntimeEvent::Error {
                message: e.to_string(),
            })
            .await;
            if let Err(status_err) = self.store.set_agent_status(agent_id, AgentStatus::Error).await
            {
                warn!(error = %status_err, "Failed to mark agent as errored");
            }
        }

        self.write_checkpoint(agent_id, iterations).await;
        result
    }

    /// Resume an agent parked in `WaitingInput` with external input.
    pub async fn resume_with_input(
        &self,
        agent_id: &AgentId,
        content: &str,
    ) -> Result<ExecutionOutcome, RuntimeError> {
        let mut agent = self.store.agent(agent_id).await?;
        let Some(task_id) = agent.current_task.clone() else {
            return Err(RuntimeError::Assembly(format!(
                "Agent {agent_id} has no current task to resume"
            )));
        };

        agent
            .conversation_history
            .push(ConversationMessage::user(content));
        agent.status = AgentStatus::Working;
        agent.updated_at = Utc::now();
        self.store.update_agent(&agent).await?;

        self.execute_task(agent_id, &task_id).await
    }

    async fn run_loop(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        iterations: &mut u32,
    ) -> Result<ExecutionOutcome, RuntimeError> {
        // ── STARTING ──
        let mut agent = self.store.agent(agent_id).await?;
        let handler = self
            .personas
            .get(agent.persona)
            .ok_or_else(|| RuntimeError::PersonaNotRegistered(agent.persona.to_string()))?;

        let mut task = self.store.task(task_id).await?;
        // Blocked → InProgress is the explicit reassignment path.
        if matches!(task.status, TaskStatus::Todo | TaskStatus::Blocked) {
            task = self
                .store
                .set_task_status(task_id, TaskStatus::InProgress)
                .await?;
        }

        agent.status = AgentStatus::Working;
        agent.current_task = Some(task_id.clone());
        agent.updated_at = Utc::now();
        self.store.update_agent(&agent).await?;

        self.emit(RuntimeEvent::AgentStart {
            agent_id: agent_id.to_string(),
            task_id: task_id.to_string(),
        })
        .await;

        info!(
            agent = %agent.display_name,
            task = %task.title,
            max_iterations = handler.max_iterations(),
            "Agent execution starting"
        );

        let mut working_memory =
            WorkingMemory::from_entries(agent.working_memory.clone(), DEFAULT_CAPACITY);
        let tool_definitions = self
            .tools
            .definitions_for(handler.allowed_tools());
        let tool_ctx = ToolContext::new(agent_id.clone(), agent.persona, self.workspace_root.clone())
            .with_allowed_hires(handler.hire_list().to_vec());

        // ── ITERATING ──
        loop {
            // Cancellation point: once per iteration, at the loop top.
            if self.cancel.load(Ordering::SeqCst) {
                info!(agent = %agent.display_name, "Cancellation observed at iteration boundary");
                self.emit(RuntimeEvent::Cancelled).await;
                self.store
                    .set_agent_status(agent_id, AgentStatus::Idle)
                    .await?;
                return Ok(ExecutionOutcome::Cancelled);
            }

            // The counter never exceeds the persona's cap.
            if *iterations >= handler.max_iterations() {
                warn!(
                    agent = %agent.display_name,
                    iterations = *iterations,
                    "Iteration cap reached"
                );
                self.emit(RuntimeEvent::MaxIterations {
                    iterations: *iterations,
                })
                .await;
                self.store
                    .set_agent_status(agent_id, AgentStatus::Blocked)
                    .await?;
                return Ok(ExecutionOutcome::MaxIterations);
            }

            *iterations += 1;
            task.iteration_count += 1;
            self.store.update_task(&task).await?;
            self.emit(RuntimeEvent::IterationStart {
                iteration: *iterations,
            })
            .await;

            // Assemble context for this iteration.
            let bundle = self.assemble_context(&agent, &task).await?;
            self.emit(RuntimeEvent::ContextAssembled {
                tokens: bundle.total_tokens,
                sections: bundle.sections.len(),
            })
            .await;

            let mut context_text = bundle.text;
            let memory_section = working_memory.render();
            if !memory_section.is_empty() {
                context_text.push('\n');
                context_text.push_str(&memory_section);
            }

            let system = build_system_prompt(handler.system_prompt(), &tool_definitions, &context_text);
            let prompt = Self::build_prompt(&agent);

            // Call the LLM (a suspension point; not preemptible).
            let request = GenerationRequest {
                model: self.model.clone(),
                prompt,
                system: Some(system),
                temperature: handler.temperature(),
                max_tokens: Some(self.max_response_tokens),
                tools: Vec::new(),
                stop: Vec::new(),
            };
            let generation = self.backend.generate(request).await?;
            let parsed = parse_response(&generation.text);

            if let Some(thinking) = &parsed.thinking {
                self.emit(RuntimeEvent::Thinking {
                    content: thinking.clone(),
                })
                .await;
            }

            agent
                .conversation_history
                .push(ConversationMessage::agent(
                    agent.display_name.clone(),
                    parsed.content.clone(),
                ));

            // Tool calls take precedence over a final-looking answer.
            if !parsed.tool_calls.is_empty() {
                if !parsed.content.is_empty() {
                    self.emit(RuntimeEvent::Content {
                        content: parsed.content.clone(),
                    })
                    .await;
                }

                // ── TOOL_EXECUTING: strictly sequential, in parse order ──
                for call in &parsed.tool_calls {
                    self.emit(RuntimeEvent::ToolCallStart {
                        tool: call.name.clone(),
                        arguments: call.arguments.clone(),
                    })
                    .await;

                    let result = if handler.allowed_tools().iter().any(|t| *t == call.name) {
                        self.tools.execute(call, &tool_ctx).await
                    } else {
                        ToolResult::failure(
                            &call.name,
                            ErrorCode::InsufficientAuthority,
                            format!(
                                "{} is not permitted to use '{}'",
                                agent.display_name, call.name
                            ),
                        )
                    };

                    debug!(
                        tool = %call.name,
                        success = result.success,
                        "Tool executed"
                    );

                    self.store
                        .append_action(ActionRecord::new(
                            agent_id.clone(),
                            &call.name,
                            crate::summarize_value(&call.arguments),
                            result.success,
                        ))
                        .await?;

                    working_memory.push(ToolCallSummary::new(
                        &call.name,
                        result.message.clone(),
                        result.success,
                    ));

                    agent.conversation_history.push(ConversationMessage::tool(
                        &call.name,
                        format!(
                            "{}: {}",
                            if result.success { "ok" } else { "failed" },
                            result.message
                        ),
                    ));

                    self.emit(RuntimeEvent::ToolCallResult {
                        tool: call.name.clone(),
                        success: result.success,
                        message: result.message.clone(),
                        error_code: result.error_code,
                    })
                    .await;
                }

                // Persist agent state after the batch (single-row write).
                agent.working_memory = working_memory.entries();
                agent.updated_at = Utc::now();
                self.store.update_agent(&agent).await?;
                continue;
            }

            // ── Terminal states ──

            agent.working_memory = working_memory.entries();
            agent.updated_at = Utc::now();

            if parsed.needs_input {
                agent.status = AgentStatus::WaitingInput;
                self.store.update_agent(&agent).await?;
                self.emit(RuntimeEvent::UserInputRequired {
                    prompt: parsed.content.clone(),
                })
                .await;
                info!(agent = %agent.display_name, "Waiting for user input");
                return Ok(ExecutionOutcome::WaitingInput);
            }

            if let Some(reason) = parsed.blocked_reason {
                task.blocker = Some(reason.clone());
                self.store.update_task(&task).await?;
                self.store.set_task_status(task_id, TaskStatus::Blocked).await?;
                agent.status = AgentStatus::Blocked;
                self.store.update_agent(&agent).await?;
                self.emit(RuntimeEvent::Blocked {
                    reason: reason.clone(),
                })
                .await;
                info!(agent = %agent.display_name, reason = %reason, "Agent blocked");
                return Ok(ExecutionOutcome::Blocked { reason });
            }

            // FINAL: no tool calls, no markers.
            let summary = parsed.content;
            self.emit(RuntimeEvent::FinalResponse {
                content: summary.clone(),
            })
            .await;

            task.completion_summary = Some(summary.clone());
            self.store.update_task(&task).await?;
            self.store
                .set_task_status(task_id, TaskStatus::Completed)
                .await?;

            agent.status = AgentStatus::Idle;
            agent.current_task = None;
            self.store.update_agent(&agent).await?;

            self.emit(RuntimeEvent::TaskCompleted {
                task_id: task_id.to_string(),
                summary: summary.clone(),
            })
            .await;

            info!(agent = %agent.display_name, task = %task.title, "Task completed");
            return Ok(ExecutionOutcome::Completed { summary });
        }
    }

    /// The per-iteration user prompt: the latest pending user instruction
    /// if one exists, else the standing directive.
    fn build_prompt(agent: &devsquad_core::AgentInstance) -> String {
        agent
            .conversation_history
            .iter()
            .rev()
            .find(|m| m.role == devsquad_core::MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_else(|| {
                "Continue working on the current task described in your context. \
                 Use tools as needed; reply with your final answer when done."
                    .into()
            })
    }

    async fn assemble_context(
        &self,
        agent: &devsquad_core::AgentInstance,
        task: &devsquad_core::Task,
    ) -> Result<crate::context::ContextBundle, RuntimeError> {
        let manifest = self.store.manifest().await?;
        let decisions = self.store.recent_decisions(10).await?;
        let contracts = self.store.api_contracts().await?;
        let artifacts = self.store.artifacts().await?;
        let team = self.store.agents().await?;
        let subteam: Vec<_> = team
            .iter()
            .filter(|a| agent.hired_agents.contains(&a.id))
            .cloned()
            .collect();
        let actions = self
            .store
            .recent_actions(Utc::now() - Duration::hours(1), 20)
            .await?;
        let mut dependencies = Vec::new();
        for dep_id in &task.depends_on {
            if let Ok(dep) = self.store.task(dep_id).await {
                dependencies.push(dep);
            }
        }
        let memories = self.store.memories(10).await?;

        let input = AssemblyInput {
            manifest: manifest.as_ref(),
            task,
            decisions: &decisions,
            contracts: &contracts,
            artifacts: &artifacts,
            team: &team,
            subteam: &subteam,
            actions: &actions,
            dependencies: &dependencies,
            conversation: &agent.conversation_history,
            memories: &memories,
        };
        Ok(self.assembler.assemble(&input))
    }

    /// Best-effort checkpoint at the end of every execution. Write-only:
    /// nothing in the core reads these back.
    async fn write_checkpoint(&self, agent_id: &AgentId, iterations: u32) {
        let Ok(agent) = self.store.agent(agent_id).await else {
            return;
        };
        let checkpoint = Checkpoint {
            agent_id: agent_id.clone(),
            iteration_count: iterations,
            working_memory: agent.working_memory.clone(),
            conversation_history: agent.conversation_history.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.write_checkpoint(checkpoint).await {
            warn!(agent_id = %agent_id, error = %e, "Failed to write checkpoint");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaHandler;
    use crate::test_helpers::{drain, ScriptedBackend};
    use devsquad_core::{AgentInstance, PersonaRole, Task};
    use devsquad_store::InMemoryStore;

    /// A persona with a configurable iteration cap for loop tests.
    struct TestPersona {
        cap: u32,
    }

    impl PersonaHandler for TestPersona {
        fn role(&self) -> PersonaRole {
            PersonaRole::BackendLead
        }
        fn system_prompt(&self) -> &str {
            "You are a test persona."
        }
        fn allowed_tools(&self) -> &[&'static str] {
            &["create_task", "read_file"]
        }
        fn hire_list(&self) -> &[PersonaRole] {
            &[]
        }
        fn max_iterations(&self) -> u32 {
            self.cap
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        runtime: AgentRuntime,
        events: mpsc::Receiver<RuntimeEvent>,
        cancel: Arc<AtomicBool>,
        agent_id: AgentId,
        task_id: TaskId,
    }

    async fn fixture(responses: Vec<&str>, cap: u32) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let backend = Arc::new(ScriptedBackend::new(responses));
        let tools = Arc::new(devsquad_tools::default_registry(store.clone()));

        let mut personas = PersonaRegistry::new();
        personas.register(Arc::new(TestPersona { cap }));

        let agent = AgentInstance::new(PersonaRole::BackendLead, "test-model");
        let agent_id = agent.id.clone();
        store.insert_agent(agent).await.unwrap();

        let task = Task::new("Test task", "Do the thing");
        let task_id = task.id.clone();
        store.insert_task(task).await.unwrap();

        let (tx, rx) = mpsc::channel(256);
        let cancel = Arc::new(AtomicBool::new(false));
        let runtime = AgentRuntime::new(
            store.clone(),
            backend,
            tools,
            Arc::new(personas),
            ContextAssembler::with_default_budget(),
            "test-model",
            std::env::temp_dir(),
            tx,
            cancel.clone(),
        );

        Fixture {
            store,
            runtime,
            events: rx,
            cancel,
            agent_id,
            task_id,
        }
    }

    #[tokio::test]
    async fn final_response_completes_task() {
        let mut fx = fixture(vec!["The feature is implemented and tested."], 5).await;

        let outcome = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                summary: "The feature is implemented and tested.".into()
            }
        );

        let task = fx.store.task(&fx.task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(
            task.completion_summary.as_deref(),
            Some("The feature is implemented and tested.")
        );

        let agent = fx.store.agent(&fx.agent_id).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.current_task.is_none());

        // Checkpoint written on the success path too.
        assert_eq!(fx.store.checkpoint_count(&fx.agent_id).await.unwrap(), 1);

        let events = drain(&mut fx.events);
        let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert!(types.contains(&"agent_start"));
        assert!(types.contains(&"iteration_start"));
        assert!(types.contains(&"context_assembled"));
        assert!(types.contains(&"final_response"));
        assert!(types.contains(&"task_completed"));
    }

    #[tokio::test]
    async fn scenario_a_iteration_cap_blocks_agent() {
        // max_iterations = 1 and a backend that always wants a tool call:
        // the tool executes once, then the next boundary hits the cap.
        let tool_call =
            "```tool_call\n{\"tool\": \"create_task\", \"arguments\": {\"title\": \"sub\", \"description\": \"d\"}}\n```";
        let mut fx = fixture(vec![tool_call, tool_call], 1).await;

        let outcome = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::MaxIterations);

        let agent = fx.store.agent(&fx.agent_id).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Blocked);

        // Exactly one tool execution happened.
        let actions = fx
            .store
            .recent_actions(Utc::now() - Duration::hours(1), 50)
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);

        let events = drain(&mut fx.events);
        assert!(events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::MaxIterations { iterations: 1 })));
    }

    #[tokio::test]
    async fn needs_input_parks_agent() {
        let mut fx = fixture(vec!["Which database do you prefer? [NEEDS_USER_INPUT]"], 5).await;

        let outcome = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::WaitingInput);

        let agent = fx.store.agent(&fx.agent_id).await.unwrap();
        assert_eq!(agent.status, AgentStatus::WaitingInput);
        // The task is untouched by the pause — still in progress.
        let task = fx.store.task(&fx.task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);

        let events = drain(&mut fx.events);
        assert!(events
            .iter()
            .any(|e| e.event_type() == "user_input_required"));
    }

    #[tokio::test]
    async fn blocked_marker_blocks_task_and_agent() {
        let mut fx = fixture(vec!["[BLOCKED: missing payment credentials]"], 5).await;

        let outcome = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ExecutionOutcome::Blocked {
                reason: "missing payment credentials".into()
            }
        );

        let task = fx.store.task(&fx.task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Blocked);
        assert_eq!(task.blocker.as_deref(), Some("missing payment credentials"));
        assert_eq!(
            fx.store.agent(&fx.agent_id).await.unwrap().status,
            AgentStatus::Blocked
        );
        let _ = drain(&mut fx.events);
    }

    #[tokio::test]
    async fn disallowed_tool_is_insufficient_authority() {
        // TestPersona may not hire; the loop still produces exactly one
        // contained ToolResult and continues to the final answer.
        let responses = vec![
            "```tool_call\n{\"tool\": \"hire_agent\", \"arguments\": {\"role\": \"qa\"}}\n```",
            "Done without hiring.",
        ];
        let mut fx = fixture(responses, 5).await;

        let outcome = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));

        let events = drain(&mut fx.events);
        let denied = events
            .iter()
            .find_map(|e| match e {
                RuntimeEvent::ToolCallResult {
                    success,
                    error_code,
                    ..
                } => Some((*success, *error_code)),
                _ => None,
            })
            .unwrap();
        assert_eq!(denied, (false, Some(ErrorCode::InsufficientAuthority)));

        // The failure is still an action record.
        let actions = fx
            .store
            .recent_actions(Utc::now() - Duration::hours(1), 50)
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert!(!actions[0].success);
    }

    #[tokio::test]
    async fn cancellation_checked_at_loop_top() {
        let mut fx = fixture(vec!["never reached"], 5).await;
        fx.cancel.store(true, Ordering::SeqCst);

        let outcome = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::Cancelled);

        let events = drain(&mut fx.events);
        assert!(events.iter().any(|e| e.event_type() == "cancelled"));
        // No LLM call, no iterations.
        assert!(!events.iter().any(|e| e.event_type() == "iteration_start"));
    }

    #[tokio::test]
    async fn backend_error_propagates_after_error_event() {
        let mut fx = fixture(vec![], 5).await; // exhausted backend errors

        let err = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Llm(_)));

        let agent = fx.store.agent(&fx.agent_id).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Error);

        // Checkpoint written on the failure path as well.
        assert_eq!(fx.store.checkpoint_count(&fx.agent_id).await.unwrap(), 1);

        let events = drain(&mut fx.events);
        assert!(events.iter().any(|e| e.event_type() == "error"));
    }

    #[tokio::test]
    async fn working_memory_capped_at_twenty() {
        // 25 tool-calling iterations under a generous cap; the persisted
        // working memory holds only the most recent 20 summaries.
        let tool_call =
            "```tool_call\n{\"tool\": \"read_file\", \"arguments\": {\"path\": \"missing.txt\"}}\n```";
        let mut responses = vec![tool_call; 25];
        responses.push("done");
        let mut fx = fixture(responses, 30).await;

        let outcome = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));

        let agent = fx.store.agent(&fx.agent_id).await.unwrap();
        assert_eq!(agent.working_memory.len(), 20);
        let _ = drain(&mut fx.events);
    }

    #[tokio::test]
    async fn resume_with_input_reenters_loop() {
        let mut fx = fixture(
            vec![
                "Which port should the server use? [NEEDS_USER_INPUT]",
                "Configured port 8080. All done.",
            ],
            5,
        )
        .await;

        let first = fx
            .runtime
            .execute_task(&fx.agent_id, &fx.task_id)
            .await
            .unwrap();
        assert_eq!(first, ExecutionOutcome::WaitingInput);

        let second = fx
            .runtime
            .resume_with_input(&fx.agent_id, "Use port 8080")
            .await
            .unwrap();
        assert!(matches!(second, ExecutionOutcome::Completed { .. }));

        let task = fx.store.task(&fx.task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        let _ = drain(&mut fx.events);
    }
}
