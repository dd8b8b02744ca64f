use std::pin::Pin;

use anyhow::Result;
use futures::{Stream, StreamExt};

use crate::buffer::LineBuffer;
use crate::event::StreamEvent;

/// Marker prefix for event-bearing lines.
const DATA_PREFIX: &str = "data: ";

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Decode a raw byte stream into structured chat events.
///
/// Lines are reassembled across chunk boundaries, so the input may be split
/// anywhere, including mid-marker or mid-JSON. Only lines carrying the
/// `data: ` marker produce events; a line whose payload fails to parse is
/// dropped without disturbing the rest of the stream. A read failure from the
/// underlying transport is yielded as a terminal error.
pub fn decode_sse<S, B, E>(bytes: S) -> EventStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(bytes);
        let mut buffer = LineBuffer::with_capacity(4096);
        let mut failed = false;

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => {
                    buffer.push(chunk.as_ref());

                    while let Some(line) = buffer.next_line() {
                        if let Some(event) = event_from_line(line) {
                            yield Ok(event);
                        }
                    }
                }
                Err(e) => {
                    yield Err(e.into());
                    failed = true;
                    break;
                }
            }
        }

        // The final line may arrive without a trailing newline.
        if !failed {
            if let Some(line) = buffer.take_remaining() {
                if let Some(event) = event_from_line(line) {
                    yield Ok(event);
                }
            }
        }
    })
}

fn event_from_line(line: Result<String>) -> Option<StreamEvent> {
    let line = match line {
        Ok(line) => line,
        Err(e) => {
            tracing::debug!("Dropping undecodable line: {}", e);
            return None;
        }
    };

    if line.is_empty() {
        return None;
    }

    let data = line.strip_prefix(DATA_PREFIX)?;

    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("Dropping malformed event payload: {}", e);
            None
        }
    }
}
