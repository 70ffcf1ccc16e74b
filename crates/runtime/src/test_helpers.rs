//! Shared test helpers for runtime tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use devsquad_core::llm::{Generation, GenerationRequest, LlmBackend, Usage};
use devsquad_core::{LlmError, RuntimeEvent};
use tokio::sync::mpsc;

/// A mock backend that returns a sequence of scripted raw responses.
///
/// Each `generate` call pops the next response. An exhausted script
/// returns an API error, which tests use to exercise the failure path.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<Generation, LlmError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(text) => Ok(Generation {
                text,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "scripted-model".into(),
            }),
            None => Err(LlmError::ApiError {
                status_code: 599,
                message: "scripted backend exhausted".into(),
            }),
        }
    }
}

/// Collect every event currently buffered on the channel.
pub fn drain(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<RuntimeEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
