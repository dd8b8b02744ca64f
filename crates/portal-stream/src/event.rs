use serde::{Deserialize, Serialize};

/// Events carried on the chat stream, one per `data: ` line.
///
/// The backend may also send a `conversation_id` field on any event; it is
/// advisory and ignored here, along with any other field the variant does not
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The supervisor reasoning about how to handle the request.
    Thinking {
        #[serde(default)]
        content: String,
    },

    /// A delegated sub-agent finished its task and reported output.
    AgentOutput {
        #[serde(default)]
        content: String,
        #[serde(default)]
        agent: String,
        #[serde(default)]
        tools_used: Vec<String>,
    },

    /// The final synthesized reply text.
    Message {
        #[serde(default)]
        content: String,
    },

    /// The stream has logically ended.
    Done,

    /// An event kind this client does not know about.
    #[serde(other)]
    Unknown,
}
