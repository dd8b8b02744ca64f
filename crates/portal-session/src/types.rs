use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Agent,
}

/// One transcript entry. The transcript is append-only; entries are never
/// mutated or reordered after insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
}

/// Where an agent is in its per-turn lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Working,
    Done,
    Error,
}

/// Live status of one agent during the current turn. Cleared when the turn
/// ends; never carried over to the next turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStatus {
    pub name: String,
    pub status: AgentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,
}

/// Point-in-time copy of the observable session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub active_agents: Vec<AgentStatus>,
    pub is_streaming: bool,
}
