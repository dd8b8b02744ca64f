use thiserror::Error;

/// Call-boundary rejections from [`crate::ChatSession::send_message`].
///
/// These are documented no-ops, not turn failures: session state is untouched
/// when one is returned, and nothing is appended to the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("a turn is already streaming for this conversation")]
    TurnInFlight,
}
