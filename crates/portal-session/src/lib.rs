pub mod error;
pub mod ids;
pub mod session;
pub mod transport;
pub mod types;

pub use error::SendError;
pub use ids::{IdSource, UuidSource};
pub use session::{ChatSession, SUPERVISOR_AGENT};
pub use transport::{ByteStream, ChatTransport};
pub use types::{AgentState, AgentStatus, ChatSnapshot, Message, Role};
