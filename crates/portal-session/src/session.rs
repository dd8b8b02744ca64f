use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use portal_stream::{decode_sse, StreamEvent};

use crate::error::SendError;
use crate::ids::{IdSource, UuidSource};
use crate::transport::ChatTransport;
use crate::types::{AgentState, AgentStatus, ChatSnapshot, Message, Role};

/// Reserved status-panel identity for the orchestrator itself.
pub const SUPERVISOR_AGENT: &str = "supervisor";

struct SessionState {
    conversation_id: String,
    messages: Vec<Message>,
    active_agents: Vec<AgentStatus>,
    is_streaming: bool,
    /// Bumped on every reset. A turn folds events only while its captured
    /// epoch matches; anything older is discarded.
    epoch: u64,
    /// Final reply text reported by the backend, held until the turn ends.
    pending_reply: Option<String>,
}

/// One open conversation with the portal assistant.
///
/// The session exclusively owns its transcript, agent-status set, and
/// streaming lifecycle; callers mutate it only through the operations below
/// and observe it through [`ChatSession::subscribe`] or
/// [`ChatSession::snapshot`]. Events from a turn are folded one at a time, in
/// arrival order, on a task spawned per turn.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    ids: Arc<dyn IdSource>,
    state: Mutex<SessionState>,
    updates: watch::Sender<ChatSnapshot>,
    turn: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Arc<Self> {
        Self::with_ids(transport, Arc::new(UuidSource))
    }

    pub fn with_ids(transport: Arc<dyn ChatTransport>, ids: Arc<dyn IdSource>) -> Arc<Self> {
        let state = SessionState {
            conversation_id: ids.generate(),
            messages: Vec::new(),
            active_agents: Vec::new(),
            is_streaming: false,
            epoch: 0,
            pending_reply: None,
        };
        let (updates, _) = watch::channel(snapshot_of(&state));

        Arc::new(Self {
            transport,
            ids,
            state: Mutex::new(state),
            updates,
            turn: Mutex::new(None),
        })
    }

    /// Send a user message and start streaming the reply.
    ///
    /// The user message is appended before any network activity. The turn
    /// itself runs on a spawned task; observe its progress through
    /// [`ChatSession::subscribe`]. Rejects blank input and concurrent turns
    /// without touching any state.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn send_message(self: &Arc<Self>, content: &str) -> Result<(), SendError> {
        if content.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }

        let (epoch, conversation_id) = {
            let mut state = self.state.lock().unwrap();
            if state.is_streaming {
                return Err(SendError::TurnInFlight);
            }

            let message = self.make_message(&state, Role::User, content.to_string(), None, None);
            state.messages.push(message);
            state.is_streaming = true;
            state.pending_reply = None;
            (state.epoch, state.conversation_id.clone())
        };
        self.publish();

        tracing::info!(conversation_id = %conversation_id, "Starting chat turn");

        let session = Arc::clone(self);
        let content = content.to_string();
        let handle = tokio::spawn(async move {
            session.run_turn(epoch, content, conversation_id).await;
        });
        *self.turn.lock().unwrap() = Some(handle);

        Ok(())
    }

    /// Drop the current conversation and start a fresh one.
    ///
    /// Safe to call mid-stream: the in-flight turn is cancelled and its
    /// remaining events are never folded into the new conversation.
    pub fn new_conversation(&self) {
        if let Some(handle) = self.turn.lock().unwrap().take() {
            handle.abort();
        }

        {
            let mut state = self.state.lock().unwrap();
            state.epoch += 1;
            state.conversation_id = self.ids.generate();
            state.messages.clear();
            state.active_agents.clear();
            state.is_streaming = false;
            state.pending_reply = None;
        }
        self.publish();
    }

    /// Clear the transcript, keeping the conversation id and any in-flight
    /// stream.
    pub fn clear_messages(&self) {
        self.state.lock().unwrap().messages.clear();
        self.publish();
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        snapshot_of(&self.state.lock().unwrap())
    }

    /// Watch channel carrying a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.updates.subscribe()
    }

    pub fn conversation_id(&self) -> String {
        self.state.lock().unwrap().conversation_id.clone()
    }

    pub fn is_streaming(&self) -> bool {
        self.state.lock().unwrap().is_streaming
    }

    async fn run_turn(self: Arc<Self>, epoch: u64, content: String, conversation_id: String) {
        let bytes = match self.transport.send(&content, &conversation_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conversation_id = %conversation_id, "Chat request failed: {:#}", e);
                self.fail_turn(epoch, &e.to_string());
                return;
            }
        };

        let mut events = decode_sse(bytes);
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if !self.fold_event(epoch, event) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(conversation_id = %conversation_id, "Chat stream failed: {:#}", e);
                    self.fail_turn(epoch, &e.to_string());
                    return;
                }
            }
        }

        // Runs for a clean close with or without an explicit done event.
        self.finish_turn(epoch);
    }

    /// Apply one decoded event. Returns false once the turn is over and the
    /// rest of the stream should be discarded.
    fn fold_event(&self, epoch: u64, event: StreamEvent) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.epoch != epoch {
            return false;
        }

        match event {
            StreamEvent::Thinking { content } => {
                upsert_agent(
                    &mut state.active_agents,
                    SUPERVISOR_AGENT,
                    AgentState::Working,
                    Some(content),
                );
            }
            StreamEvent::AgentOutput {
                content,
                agent,
                tools_used,
            } => {
                let message = self.make_message(
                    &state,
                    Role::Agent,
                    content,
                    Some(agent.clone()),
                    Some(tools_used),
                );
                state.messages.push(message);
                // An output with no earlier start event still gets an entry.
                upsert_agent(&mut state.active_agents, &agent, AgentState::Done, None);
            }
            StreamEvent::Message { content } => {
                // Latest wins if the backend sends more than one.
                state.pending_reply = Some(content);
                return true;
            }
            StreamEvent::Done => {
                if let Some(content) = state.pending_reply.take() {
                    let message = self.make_message(&state, Role::Assistant, content, None, None);
                    state.messages.push(message);
                }
                return false;
            }
            StreamEvent::Unknown => return true,
        }

        drop(state);
        self.publish();
        true
    }

    /// End-of-turn cleanup: streaming flag off, agent panel emptied.
    fn finish_turn(&self, epoch: u64) {
        {
            let mut state = self.state.lock().unwrap();
            if state.epoch != epoch {
                return;
            }
            state.is_streaming = false;
            state.active_agents.clear();
            state.pending_reply = None;
        }
        self.publish();
    }

    /// A failed turn leaves exactly one assistant-role error message.
    fn fail_turn(&self, epoch: u64, reason: &str) {
        {
            let mut state = self.state.lock().unwrap();
            if state.epoch != epoch {
                return;
            }
            let message = self.make_message(
                &state,
                Role::Assistant,
                format!("Error: {}", reason),
                None,
                None,
            );
            state.messages.push(message);
            state.is_streaming = false;
            state.active_agents.clear();
            state.pending_reply = None;
        }
        self.publish();
    }

    fn make_message(
        &self,
        state: &SessionState,
        role: Role,
        content: String,
        agent_name: Option<String>,
        tools_used: Option<Vec<String>>,
    ) -> Message {
        Message {
            id: self.ids.generate(),
            role,
            content,
            agent_name,
            tools_used,
            timestamp: next_timestamp(state),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.updates.send_replace(snapshot);
    }
}

fn snapshot_of(state: &SessionState) -> ChatSnapshot {
    ChatSnapshot {
        conversation_id: state.conversation_id.clone(),
        messages: state.messages.clone(),
        active_agents: state.active_agents.clone(),
        is_streaming: state.is_streaming,
    }
}

/// Transcript timestamps never go backwards, even if the wall clock does.
fn next_timestamp(state: &SessionState) -> DateTime<Utc> {
    let now = Utc::now();
    match state.messages.last() {
        Some(last) if last.timestamp > now => last.timestamp,
        _ => now,
    }
}

/// At most one status entry per agent name; insertion order is preserved.
/// `last_action` is only overwritten when the update carries one.
fn upsert_agent(
    agents: &mut Vec<AgentStatus>,
    name: &str,
    status: AgentState,
    last_action: Option<String>,
) {
    match agents.iter_mut().find(|a| a.name == name) {
        Some(agent) => {
            agent.status = status;
            if last_action.is_some() {
                agent.last_action = last_action;
            }
        }
        None => agents.push(AgentStatus {
            name: name.to_string(),
            status,
            last_action,
        }),
    }
}
