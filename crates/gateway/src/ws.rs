//! WebSocket session handlers.
//!
//! One async task per connection; the execution work runs on a worker
//! task so the handler can keep reading frames (notably `cancel`) while
//! an execution is in flight. Cancellation stays cooperative: the flag is
//! set here and observed at the runtime's iteration boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::StreamExt;
use futures::SinkExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use devsquad_core::{AgentId, RuntimeEvent, TaskId};
use devsquad_store::ProjectStore;

use crate::SharedState;

/// Client frames on `/ws/agent`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AgentClientMessage {
    ExecuteTask {
        task_id: String,
        #[serde(default)]
        agent_id: Option<String>,
    },
    UserInput {
        content: String,
    },
    Cancel,
}

/// Client frames on `/ws/team`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TeamClientMessage {
    Message { content: String },
    Ping,
}

pub async fn agent_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_agent_session(socket, state))
}

pub async fn team_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_team_session(socket, state))
}

fn event_frame(event: &RuntimeEvent) -> WsMessage {
    WsMessage::Text(serde_json::to_string(event).unwrap_or_default().into())
}

/// Commands forwarded to the agent worker task.
enum AgentCommand {
    Execute {
        task_id: TaskId,
        agent_id: Option<AgentId>,
    },
    UserInput {
        content: String,
    },
}

async fn handle_agent_session(socket: WebSocket, state: SharedState) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Agent WebSocket connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (event_tx, mut event_rx) = mpsc::channel::<RuntimeEvent>(256);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<AgentCommand>(16);
    let cancel = Arc::new(AtomicBool::new(false));

    let _ = ws_tx
        .send(event_frame(&RuntimeEvent::Connected {
            session_id: session_id.clone(),
        }))
        .await;

    // Worker: processes executions sequentially; the handler loop keeps
    // reading frames so `cancel` can land mid-execution.
    let mut worker = {
        let executor = state.executor.clone();
        let events = event_tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut last_agent: Option<AgentId> = None;
            while let Some(cmd) = cmd_rx.recv().await {
                cancel.store(false, Ordering::SeqCst);
                let result = match cmd {
                    AgentCommand::Execute { task_id, agent_id } => {
                        let agent_id = match resolve_agent(&executor, &task_id, agent_id).await {
                            Ok(id) => id,
                            Err(message) => {
                                let _ = events.send(RuntimeEvent::Error { message }).await;
                                continue;
                            }
                        };
                        last_agent = Some(agent_id.clone());
                        executor
                            .execute(&agent_id, &task_id, events.clone(), cancel.clone())
                            .await
                    }
                    AgentCommand::UserInput { content } => {
                        let Some(agent_id) = last_agent.clone() else {
                            let _ = events
                                .send(RuntimeEvent::Error {
                                    message: "No agent is waiting for input".into(),
                                })
                                .await;
                            continue;
                        };
                        executor
                            .runtime(events.clone(), cancel.clone())
                            .resume_with_input(&agent_id, &content)
                            .await
                    }
                };

                match result {
                    Ok(_) => {
                        let _ = events.send(RuntimeEvent::Done).await;
                    }
                    Err(e) => {
                        // The runtime already emitted the error event;
                        // runtime errors are fatal to the session.
                        warn!(error = %e, "Agent execution failed, closing session");
                        return;
                    }
                }
            }
        })
    };

    loop {
        tokio::select! {
            // Runtime errors end the worker — and with it, the session.
            _ = &mut worker => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                if ws_tx.send(event_frame(&event)).await.is_err() {
                    break; // client disconnected
                }
            }
            frame = ws_rx.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => continue, // ignore binary, ping, pong
                    Some(Err(_)) => break,
                };
                match serde_json::from_str::<AgentClientMessage>(&text) {
                    Ok(AgentClientMessage::Cancel) => {
                        // Observed at the next iteration boundary.
                        cancel.store(true, Ordering::SeqCst);
                    }
                    Ok(AgentClientMessage::ExecuteTask { task_id, agent_id }) => {
                        let cmd = AgentCommand::Execute {
                            task_id: TaskId::from(&task_id),
                            agent_id: agent_id.map(|id| AgentId::from(&id)),
                        };
                        if cmd_tx.send(cmd).await.is_err() {
                            break; // worker died on a runtime error
                        }
                    }
                    Ok(AgentClientMessage::UserInput { content }) => {
                        if cmd_tx.send(AgentCommand::UserInput { content }).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let event = RuntimeEvent::Error {
                            message: format!("Invalid message: {e}"),
                        };
                        if ws_tx.send(event_frame(&event)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    // Flush anything still buffered (the final error event, typically)
    // so no failure is dropped silently on the way out.
    while let Ok(event) = event_rx.try_recv() {
        if ws_tx.send(event_frame(&event)).await.is_err() {
            break;
        }
    }

    // Disconnection cancels the underlying work.
    cancel.store(true, Ordering::SeqCst);
    worker.abort();
    info!(session_id = %session_id, "Agent WebSocket closed");
}

/// Pick the executing agent: explicit id, else the task's assignee.
async fn resolve_agent(
    executor: &devsquad_runtime::AgentExecutor,
    task_id: &TaskId,
    explicit: Option<AgentId>,
) -> Result<AgentId, String> {
    if let Some(id) = explicit {
        return Ok(id);
    }
    let task = executor
        .store()
        .task(task_id)
        .await
        .map_err(|e| e.to_string())?;
    task.assigned_agent
        .ok_or_else(|| format!("Task '{task_id}' has no assigned agent; pass agent_id"))
}

async fn handle_team_session(socket: WebSocket, state: SharedState) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Team WebSocket connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (event_tx, mut event_rx) = mpsc::channel::<RuntimeEvent>(256);
    let (msg_tx, mut msg_rx) = mpsc::channel::<String>(16);

    let _ = ws_tx
        .send(event_frame(&RuntimeEvent::Connected {
            session_id: session_id.clone(),
        }))
        .await;

    // Worker owns the session state; user messages arrive through the
    // channel, so events stream out while a turn is being generated.
    let mut worker = {
        let events = event_tx.clone();
        let mut session = state.executor.team_session(event_tx.clone());
        tokio::spawn(async move {
            while let Some(content) = msg_rx.recv().await {
                if let Err(e) = session.handle_user_message(&content).await {
                    warn!(error = %e, "Team conversation failed");
                    let _ = events
                        .send(RuntimeEvent::Error {
                            message: e.to_string(),
                        })
                        .await;
                    return;
                }
            }
        })
    };

    loop {
        tokio::select! {
            _ = &mut worker => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                if ws_tx.send(event_frame(&event)).await.is_err() {
                    break;
                }
            }
            frame = ws_rx.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                };
                match serde_json::from_str::<TeamClientMessage>(&text) {
                    Ok(TeamClientMessage::Ping) => {
                        if ws_tx.send(event_frame(&RuntimeEvent::Pong)).await.is_err() {
                            break;
                        }
                    }
                    Ok(TeamClientMessage::Message { content }) => {
                        if msg_tx.send(content).await.is_err() {
                            break; // worker died on a runtime error
                        }
                    }
                    Err(e) => {
                        let event = RuntimeEvent::Error {
                            message: format!("Invalid message: {e}"),
                        };
                        if ws_tx.send(event_frame(&event)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    while let Ok(event) = event_rx.try_recv() {
        if ws_tx.send(event_frame(&event)).await.is_err() {
            break;
        }
    }

    worker.abort();
    info!(session_id = %session_id, "Team WebSocket closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_client_messages_parse() {
        let msg: AgentClientMessage =
            serde_json::from_str(r#"{"type":"execute_task","task_id":"t-1"}"#).unwrap();
        assert!(matches!(
            msg,
            AgentClientMessage::ExecuteTask { agent_id: None, .. }
        ));

        let msg: AgentClientMessage =
            serde_json::from_str(r#"{"type":"user_input","content":"use sqlite"}"#).unwrap();
        assert!(matches!(msg, AgentClientMessage::UserInput { .. }));

        let msg: AgentClientMessage = serde_json::from_str(r#"{"type":"cancel"}"#).unwrap();
        assert!(matches!(msg, AgentClientMessage::Cancel));
    }

    #[test]
    fn team_client_messages_parse() {
        let msg: TeamClientMessage =
            serde_json::from_str(r#"{"type":"message","content":"build an app"}"#).unwrap();
        assert!(matches!(msg, TeamClientMessage::Message { .. }));

        let msg: TeamClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, TeamClientMessage::Ping));
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        assert!(serde_json::from_str::<AgentClientMessage>(r#"{"type":"reboot"}"#).is_err());
        assert!(serde_json::from_str::<TeamClientMessage>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn event_frames_are_text_json() {
        let frame = event_frame(&RuntimeEvent::Done);
        match frame {
            WsMessage::Text(text) => assert!(text.contains(r#""type":"done""#)),
            _ => panic!("expected text frame"),
        }
    }
}
