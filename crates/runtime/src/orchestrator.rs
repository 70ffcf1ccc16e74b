//! The team conversation orchestrator.
//!
//! Decides, after each message, which of the four conversation personas
//! (Alex, Sarah, Marcus, Elena) speaks next — via the rule table in
//! [`crate::rules`] — and streams that persona's reply chunk by chunk.
//! Personas never speak concurrently: turns are strictly sequential
//! within a session.
//!
//! The session log is append-only and unbounded within the session; only
//! the trailing window (default 10 messages) is rendered into the next
//! persona's prompt.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{debug, info};

use devsquad_config::OrchestratorConfig;
use devsquad_core::llm::{GenerationRequest, LlmBackend};
use devsquad_core::message::ConversationMessage;
use devsquad_core::{PersonaRole, RuntimeError, RuntimeEvent};

use crate::chunker::StreamChunker;
use crate::persona::{PersonaHandler, PersonaRegistry};
use crate::rules::{default_rules, select_next_speaker, RuleOutcome, TurnContext, TurnRule};

/// Per-speaker consecutive-turn telemetry.
///
/// The counter increments when a speaker repeats and resets once it
/// reaches the configured cap. It is write-only with respect to routing:
/// resetting never feeds back into the turn decision. (Making it an
/// enforced hard cap is a product decision deliberately not taken here.)
#[derive(Debug, Default)]
struct ConsecutiveTurns {
    last_speaker: Option<String>,
    count: u32,
}

/// One multi-persona conversation session.
pub struct TeamOrchestrator {
    backend: Arc<dyn LlmBackend>,
    personas: Arc<PersonaRegistry>,
    config: OrchestratorConfig,
    model: String,
    events: mpsc::Sender<RuntimeEvent>,
    rules: Vec<TurnRule>,
    rng: StdRng,

    messages: Vec<ConversationMessage>,
    turns_taken: usize,
    consecutive: ConsecutiveTurns,
}

impl TeamOrchestrator {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        personas: Arc<PersonaRegistry>,
        config: OrchestratorConfig,
        model: impl Into<String>,
        events: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            backend,
            personas,
            config,
            model: model.into(),
            events,
            rules: default_rules(),
            rng: StdRng::from_os_rng(),
            messages: Vec::new(),
            turns_taken: 0,
            consecutive: ConsecutiveTurns::default(),
        }
    }

    /// Fix the RNG seed (tests exercising the random lead branch).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The full session log (append-only).
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn turns_taken(&self) -> usize {
        self.turns_taken
    }

    async fn emit(&self, event: RuntimeEvent) {
        let _ = self.events.send(event).await;
    }

    /// Handle one user message: append it, then run persona turns until a
    /// rule decides to wait for the user.
    pub async fn handle_user_message(&mut self, content: &str) -> Result<(), RuntimeError> {
        self.messages.push(ConversationMessage::user(content));
        info!(turns = self.turns_taken, "User message received");

        loop {
            let ctx = TurnContext {
                turns_taken: self.turns_taken,
                max_turns: self.config.max_turns,
                messages: &self.messages,
            };
            let (outcome, rule) = select_next_speaker(&ctx, &mut self.rng, &self.rules);
            debug!(rule, ?outcome, "Turn decision");

            match outcome {
                RuleOutcome::WaitForUser => {
                    self.emit(RuntimeEvent::WaitingForUser).await;
                    return Ok(());
                }
                RuleOutcome::Speak(role) => {
                    self.run_turn(role).await?;
                }
            }
        }
    }

    /// Stream one persona's reply and append it to the session log.
    async fn run_turn(&mut self, role: PersonaRole) -> Result<(), RuntimeError> {
        let handler = self
            .personas
            .get(role)
            .ok_or_else(|| RuntimeError::PersonaNotRegistered(role.to_string()))?;
        let speaker = role.display_name();

        let prompt = self.render_window();
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt,
            system: Some(handler.system_prompt().to_string()),
            temperature: handler.temperature(),
            max_tokens: Some(1024),
            tools: Vec::new(),
            stop: Vec::new(),
        };

        let mut rx = self.backend.generate_stream(request).await?;
        let mut chunker = StreamChunker::new(self.config.chunk_tokens);
        let mut reply = String::new();

        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(delta) = chunk.delta {
                reply.push_str(&delta);
                for piece in chunker.push(&delta) {
                    self.send_chunk(speaker, piece).await;
                }
            }
            if chunk.done {
                break;
            }
        }
        if let Some(rest) = chunker.finish() {
            self.send_chunk(speaker, rest).await;
        }

        self.emit(RuntimeEvent::MessageComplete {
            speaker: speaker.to_string(),
            content: reply.clone(),
        })
        .await;

        self.messages
            .push(ConversationMessage::agent(speaker, reply));
        self.turns_taken += 1;
        self.note_turn(speaker);

        info!(speaker, turns = self.turns_taken, "Persona turn complete");
        Ok(())
    }

    async fn send_chunk(&self, speaker: &str, content: String) {
        self.emit(RuntimeEvent::MessageChunk {
            speaker: speaker.to_string(),
            content,
        })
        .await;
        if self.config.chunk_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.chunk_delay_ms)).await;
        }
    }

    /// Render the trailing window of the session log as the prompt body.
    fn render_window(&self) -> String {
        let window_start = self.messages.len().saturating_sub(self.config.context_window);
        let mut out = String::new();
        for msg in &self.messages[window_start..] {
            out.push_str(&format!("{}: {}\n", msg.speaker, msg.content));
        }
        out.push_str("\nReply in character with your next message only.");
        out
    }

    fn note_turn(&mut self, speaker: &str) {
        if self.consecutive.last_speaker.as_deref() == Some(speaker) {
            self.consecutive.count += 1;
            if self.consecutive.count >= self.config.consecutive_cap {
                // Telemetry only — the reset does not alter routing.
                debug!(
                    speaker,
                    cap = self.config.consecutive_cap,
                    "Consecutive-turn cap reached, counter reset"
                );
                self.consecutive.count = 0;
            }
        } else {
            self.consecutive.last_speaker = Some(speaker.to_string());
            self.consecutive.count = 1;
        }
    }
}
